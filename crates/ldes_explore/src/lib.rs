//! LDES Explorer Engine
//!
//! Resolves the event stream behind an artifact, classifies how it is
//! fragmented, and walks its pages in order, materializing every member
//! as a typed [`ldes_core::Member`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod config;
pub mod explorer;
pub mod materialize;
pub mod members;
pub mod pages;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify_rows, Classification, Classifier};
pub use config::{ExplorerConfig, ViewPolicy};
pub use explorer::Explorer;
pub use materialize::{ExtractionWarning, Materialized, Materializer, MemberBuilder, ObjectRef};
pub use members::{ListingStrategy, MemberEnumerator, PageOutcome};
pub use pages::{build_pages, order_relations, relations_from_rows, select_views, PageCursor};
pub use resolve::{LinkResolver, ResolvedLinks};
