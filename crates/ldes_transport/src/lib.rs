//! LDES Explorer Transport
//!
//! Header-only HTTP requests and parsing of `Link` header fields
//! (RFC 8288). This is all the explorer needs from the network directly;
//! document retrieval belongs to the query provider.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod http;
pub mod link;

pub use http::{HeadResponse, HttpTransport, Transport, TransportError, TransportResult};
pub use link::{parse_link_header, Link};
