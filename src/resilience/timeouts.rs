//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound origin resolution/connect, origin reads and client head reads
//! - Turn an elapsed deadline into a `ProxyError::Timeout` naming the stage
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use crate::error::ProxyError;

pub const CLIENT_READ: &str = "client read";
pub const ORIGIN_CONNECT: &str = "origin connect";
pub const ORIGIN_READ: &str = "origin read";

/// Run `fut` with a deadline, mapping expiry to `ProxyError::Timeout`.
pub async fn with_timeout<T, F>(stage: &'static str, after: Duration, fut: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProxyError::Timeout { stage, after }),
    }
}
