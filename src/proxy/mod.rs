//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! server.rs (accept loop)
//!     → one task per connection
//!     → handler.rs (read → parse → rewrite → cache lookup → forward)
//!     → cache (shared, single lock)
//! ```
//!
//! # Design Decisions
//! - Unbounded task-per-connection; no pooling or admission control
//! - The object cache is the only state shared between connections
//! - Handlers are generic over the client stream so they run over
//!   in-memory pipes in tests

pub mod handler;
pub mod server;

pub use handler::{handle_connection, Outcome, ProxyState};
pub use server::ProxyServer;
