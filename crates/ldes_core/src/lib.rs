//! LDES Explorer Core Types
//!
//! Pure types with no I/O: the member content model, the fragment and
//! relation graph, vocabulary IRIs, and the error taxonomy shared by every
//! crate in the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod model;
pub mod value;
pub mod vocab;

// Re-exports
pub use error::{ExploreError, ExploreResult};
pub use model::{
    ArtifactRef, EventLogDescriptor, FragmentRef, Member, MemberRecord, MemberRef, Metadata,
    Relation, Relationship, Variant, ViewDescriptor,
};
pub use value::ComparisonValue;
pub use vocab::check_iri;
