//! Error taxonomy for a single proxied connection.
//!
//! Every variant is connection-local: the handler logs it and closes the
//! client socket. None of them reach the accept loop or the shared cache.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::resilience::timeouts;

/// Reasons a request head cannot be turned into an upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("request head is not valid UTF-8")]
    NotUtf8,

    #[error("request line needs method, target and version: {0:?}")]
    IncompleteRequestLine(String),

    #[error("header line has no name/value separator: {0:?}")]
    MalformedHeader(String),

    #[error("target has an empty hostname: {0:?}")]
    EmptyHost(String),

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("relative-form target {0:?} without a Host header")]
    MissingHost(String),

    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },
}

/// Errors that abort the handling of one client connection.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ParseError),

    #[error("failed to resolve origin {authority}: {source}")]
    ResolveFailed {
        authority: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to origin {authority}: {source}")]
    ConnectFailed {
        authority: String,
        #[source]
        source: io::Error,
    },

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    #[error("origin connection failed mid-response: {0}")]
    OriginReset(#[source] io::Error),

    #[error("client connection failed: {0}")]
    ClientIo(#[source] io::Error),
}

impl ProxyError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MalformedRequest(_) => "malformed_request",
            ProxyError::ResolveFailed { .. } => "resolve_failed",
            ProxyError::ConnectFailed { .. } => "connect_failed",
            ProxyError::Timeout { .. } => "timeout",
            ProxyError::OriginReset(_) => "origin_reset",
            ProxyError::ClientIo(_) => "client_io",
        }
    }

    /// True for failures while talking to the origin.
    pub fn is_origin_failure(&self) -> bool {
        matches!(
            self,
            ProxyError::ResolveFailed { .. }
                | ProxyError::ConnectFailed { .. }
                | ProxyError::OriginReset(_)
                | ProxyError::Timeout {
                    stage: timeouts::ORIGIN_CONNECT | timeouts::ORIGIN_READ,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_convert_to_malformed_request() {
        let err: ProxyError = ParseError::MissingHost("/index.html".into()).into();
        assert_eq!(err.kind(), "malformed_request");
        assert!(err.to_string().contains("without a Host header"));
        assert!(!err.is_origin_failure());
    }

    #[test]
    fn timeout_stage_decides_origin_failure() {
        let origin = ProxyError::Timeout {
            stage: timeouts::ORIGIN_READ,
            after: Duration::from_secs(1),
        };
        let client = ProxyError::Timeout {
            stage: timeouts::CLIENT_READ,
            after: Duration::from_secs(1),
        };
        assert!(origin.is_origin_failure());
        assert!(!client.is_origin_failure());
    }
}
