//! HTTP/1.0 request handling for the forward proxy.
//!
//! # Data Flow
//! ```text
//! raw request head (bytes)
//!     → parser.rs (request line, absolute/relative target, client headers)
//!     → request.rs (Request model)
//!     → rewrite.rs (Host / User-Agent / Connection / Proxy-Connection)
//!     → serializer.rs (HTTP/1.0 upstream request)
//!
//! Unsupported method:
//!     → response.rs (501 Not Implemented page)
//! ```

pub mod parser;
pub mod request;
pub mod response;
pub mod rewrite;
pub mod serializer;

pub use parser::{parse_request, parse_request_bytes};
pub use request::{Header, Request, TargetForm};
pub use rewrite::{rewrite, RewritePolicy};
pub use serializer::serialize;
