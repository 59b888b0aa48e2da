//! Query execution options.

use serde::{Deserialize, Serialize};

/// Cache behaviour requested for the documents a query reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Freshness {
    /// Intermediate caches may answer
    #[default]
    Cached,
    /// Every cache must revalidate with the origin
    Revalidate,
}

impl Freshness {
    /// `Cache-Control` value to send, if any
    #[must_use]
    pub const fn cache_control(self) -> Option<&'static str> {
        match self {
            Self::Cached => None,
            Self::Revalidate => Some("no-cache"),
        }
    }
}

/// Execution options passed with every query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Documents the query is evaluated over
    pub sources: Vec<String>,
    /// Tolerate unresolvable optional projections
    pub lenient: bool,
    /// Follow links out of the sources while evaluating
    pub follow_links: bool,
    /// Cache behaviour for source documents
    pub freshness: Freshness,
}

impl QueryOptions {
    /// Options over a single source, strict, no link following
    pub fn source(url: impl Into<String>) -> Self {
        Self {
            sources: vec![url.into()],
            ..Self::default()
        }
    }

    /// Add a source document
    #[must_use]
    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.sources.push(url.into());
        self
    }

    /// Set leniency
    #[must_use]
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Set link following
    #[must_use]
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Set freshness
    #[must_use]
    pub fn freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = freshness;
        self
    }
}
