//! Error taxonomy for LDES exploration.

/// Result type used throughout the explorer
pub type ExploreResult<T> = Result<T, ExploreError>;

/// Explorer error
///
/// Discovery and classification failures are fatal to a traversal.
/// `MalformedMember` is recovered locally by skipping the member.
/// `ProviderFailure` terminates the traversal it occurs in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExploreError {
    /// The artifact does not advertise an event stream in its link headers
    #[error("No event stream found for {artifact}")]
    NoEventStreamFound {
        /// Artifact URL that was inspected
        artifact: String,
    },

    /// The stream matched none of the known fragmentation strategies
    #[error("Unsupported event stream variant at {root}")]
    UnsupportedVariant {
        /// Root URL of the stream
        root: String,
    },

    /// Mandatory member fields are missing
    #[error("Malformed member {member}: {reason}")]
    MalformedMember {
        /// Member URL
        member: String,
        /// What was missing
        reason: String,
    },

    /// The query provider or transport failed
    #[error("Provider failure: {message}")]
    ProviderFailure {
        /// Error message from the collaborator
        message: String,
    },

    /// An IRI cannot be interpolated into a query template
    #[error("Invalid IRI: {iri}")]
    InvalidIri {
        /// Offending IRI
        iri: String,
    },
}

impl ExploreError {
    /// Create a provider failure from any displayable error
    pub fn provider(err: impl std::fmt::Display) -> Self {
        Self::ProviderFailure {
            message: err.to_string(),
        }
    }

    /// Whether this error ends the traversal it occurs in
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedMember { .. })
    }
}
