//! LDES Explorer Query Interface
//!
//! The explorer never evaluates graph queries itself. It composes queries
//! from fixed templates and hands them, together with execution options,
//! to a [`QueryProvider`]. [`SparqlEndpoint`] is the provider that talks to
//! a remote SPARQL 1.1 Protocol service.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod options;
pub mod provider;
pub mod sparql;
pub mod template;
pub mod term;

pub use options::{Freshness, QueryOptions};
pub use provider::{BindingStream, QueryError, QueryProvider, QueryResult};
pub use sparql::SparqlEndpoint;
pub use template::{Query, QueryKind};
pub use term::{Bindings, Term};
