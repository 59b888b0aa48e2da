//! SPARQL 1.1 Protocol provider.
//!
//! Queries are POSTed as `application/sparql-query`; each source becomes a
//! `default-graph-uri` parameter. Leniency and link following are settings
//! of the remote service and are only recorded in the request span.

use crate::options::QueryOptions;
use crate::provider::{BindingStream, QueryError, QueryProvider, QueryResult};
use crate::template::Query;
use crate::term::{Bindings, Term};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use indexmap::IndexMap;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Provider backed by a remote SPARQL endpoint
#[derive(Clone)]
pub struct SparqlEndpoint {
    client: Client,
    endpoint: String,
}

impl SparqlEndpoint {
    /// Create a provider for `endpoint` with a 30 second timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(endpoint: &str) -> QueryResult<Self> {
        Self::with_settings(endpoint, Duration::from_secs(30), None)
    }

    /// Create a provider with an explicit timeout and optional HTTP proxy
    ///
    /// # Errors
    ///
    /// Returns error if the proxy URL is invalid or the client cannot be built
    pub fn with_settings(endpoint: &str, timeout: Duration, proxy: Option<&str>) -> QueryResult<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self::with_client(endpoint, builder.build()?))
    }

    /// Create a provider around an existing client
    #[must_use]
    pub fn with_client(endpoint: &str, client: Client) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    /// Endpoint URL
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(&self, query: &Query, options: &QueryOptions) -> QueryResult<SparqlResults> {
        tracing::debug!(
            kind = %query.kind(),
            sources = ?options.sources,
            lenient = options.lenient,
            follow_links = options.follow_links,
            "sending query"
        );

        let graphs: Vec<(&str, &str)> = options
            .sources
            .iter()
            .map(|s| ("default-graph-uri", s.as_str()))
            .collect();

        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&graphs)
            .header(CONTENT_TYPE, SPARQL_QUERY)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .body(query.text().to_string());
        if let Some(value) = options.freshness.cache_control() {
            request = request.header(CACHE_CONTROL, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| QueryError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl QueryProvider for SparqlEndpoint {
    async fn select(&self, query: &Query, options: &QueryOptions) -> QueryResult<BindingStream> {
        let results = self.execute(query, options).await?;
        let rows = results
            .results
            .ok_or(QueryError::UnexpectedResult { expected: "bindings" })?
            .bindings;
        Ok(stream::iter(rows.into_iter().map(convert_row)).boxed())
    }

    async fn ask(&self, query: &Query, options: &QueryOptions) -> QueryResult<bool> {
        self.execute(query, options)
            .await?
            .boolean
            .ok_or(QueryError::UnexpectedResult { expected: "boolean" })
    }
}

/// `application/sparql-results+json` document
#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: Option<ResultSet>,
    boolean: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    bindings: Vec<IndexMap<String, RawTerm>>,
}

#[derive(Debug, Deserialize)]
struct RawTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    datatype: Option<String>,
    #[serde(rename = "xml:lang")]
    language: Option<String>,
}

impl TryFrom<RawTerm> for Term {
    type Error = QueryError;

    fn try_from(raw: RawTerm) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "uri" => Ok(Term::Iri(raw.value)),
            "bnode" => Ok(Term::Blank(raw.value)),
            "literal" | "typed-literal" => Ok(Term::Literal {
                value: raw.value,
                datatype: raw.datatype,
                language: raw.language,
            }),
            other => Err(QueryError::InvalidResponse(format!(
                "unknown term type: {}",
                other
            ))),
        }
    }
}

fn convert_row(row: IndexMap<String, RawTerm>) -> QueryResult<Bindings> {
    row.into_iter()
        .map(|(var, raw)| Term::try_from(raw).map(|term| (var, term)))
        .collect()
}
