//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to origin:
//!     → timeouts.rs (enforce connect/read timeout)
//!     → On failure: connection closed, nothing cached
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed origin fetch is reported by closing the client

pub mod timeouts;
