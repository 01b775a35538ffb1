//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → connection.rs (ID, live-connection tracking)
//!     → Hand off to proxy::handler
//!
//! Outgoing:
//!     proxy::handler → origin.rs (resolve + connect with timeout)
//! ```

pub mod connection;
pub mod listener;
pub mod origin;
