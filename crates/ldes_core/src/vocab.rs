//! Vocabulary IRIs used by the explorer.

use crate::error::{ExploreError, ExploreResult};

/// LDES namespace
pub const LDES_NS: &str = "https://w3id.org/ldes#";
/// TREE namespace
pub const TREE_NS: &str = "https://w3id.org/tree#";
/// Activity Streams namespace
pub const AS_NS: &str = "https://www.w3.org/ns/activitystreams#";

/// Link relation advertising the event stream an artifact belongs to
pub const REL_EVENT_STREAM: &str = "https://w3id.org/ldes#EventStream";
/// Link relation pointing at the log an event stream is written to
pub const REL_EVENT_LOG: &str = "https://w3id.org/ldes#eventLog";

/// Relation class used when a relation carries no more specific type
pub const CLASS_RELATION: &str = "https://w3id.org/tree#Relation";
/// Activity object class whose subject, relationship and object are resolved
pub const CLASS_RELATIONSHIP: &str = "https://www.w3.org/ns/activitystreams#Relationship";

/// Characters that may not appear inside an IRI reference in a query
const FORBIDDEN: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];

/// Check that an IRI can be placed between angle brackets in a query.
///
/// # Errors
///
/// Returns `InvalidIri` for empty strings, whitespace, control characters,
/// or any character excluded from IRI references.
pub fn check_iri(iri: &str) -> ExploreResult<&str> {
    let bad = iri.is_empty()
        || iri
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN.contains(&c));
    if bad {
        return Err(ExploreError::InvalidIri {
            iri: iri.to_string(),
        });
    }
    Ok(iri)
}
