//! Graph-query provider trait.

use crate::options::QueryOptions;
use crate::template::Query;
use crate::term::Bindings;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use ldes_core::ExploreError;

/// Result type for provider calls
pub type QueryResult<T> = Result<T, QueryError>;

/// Lazy sequence of solutions
pub type BindingStream = BoxStream<'static, QueryResult<Bindings>>;

/// Provider errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Request could not be sent or the connection failed
    #[error("Request failed: {0}")]
    Request(String),

    /// Service answered with a non-success status
    #[error("Query service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Service returned a boolean where bindings were expected, or the reverse
    #[error("Unexpected result form: expected {expected}")]
    UnexpectedResult {
        /// Expected form
        expected: &'static str,
    },
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

impl From<QueryError> for ExploreError {
    fn from(err: QueryError) -> Self {
        ExploreError::provider(err)
    }
}

/// Engine that evaluates graph queries over remote documents
#[async_trait]
pub trait QueryProvider: Send + Sync {
    /// Evaluate a SELECT query
    ///
    /// # Errors
    ///
    /// Returns error if the query cannot be evaluated
    async fn select(&self, query: &Query, options: &QueryOptions) -> QueryResult<BindingStream>;

    /// Evaluate an ASK query
    ///
    /// # Errors
    ///
    /// Returns error if the query cannot be evaluated
    async fn ask(&self, query: &Query, options: &QueryOptions) -> QueryResult<bool>;

    /// Evaluate a SELECT query and collect every solution
    ///
    /// # Errors
    ///
    /// Returns the first error of the query or of the solution stream
    async fn select_all(&self, query: &Query, options: &QueryOptions) -> QueryResult<Vec<Bindings>> {
        self.select(query, options).await?.try_collect().await
    }
}
