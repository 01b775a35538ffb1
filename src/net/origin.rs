//! Outbound connections to origin servers.
//!
//! # Responsibilities
//! - Resolve `host:port` through the system resolver
//! - Try each resolved address in order until one connects
//! - Bound the whole resolve + connect sequence with a timeout

use std::io;
use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};

use crate::error::ProxyError;
use crate::resilience::timeouts::{with_timeout, ORIGIN_CONNECT};

/// Opens TCP connections to origins.
#[derive(Debug, Clone)]
pub struct OriginConnector {
    connect_timeout: Duration,
}

impl OriginConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Connect to `host:port`, failing with `ResolveFailed`, `ConnectFailed`
    /// or `Timeout`.
    pub async fn connect(&self, host: &str, port: &str) -> Result<TcpStream, ProxyError> {
        let authority = format!("{}:{}", host, port);
        with_timeout(ORIGIN_CONNECT, self.connect_timeout, connect_any(authority)).await
    }
}

async fn connect_any(authority: String) -> Result<TcpStream, ProxyError> {
    let addrs = lookup_host(authority.as_str())
        .await
        .map_err(|source| ProxyError::ResolveFailed {
            authority: authority.clone(),
            source,
        })?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                tracing::debug!(origin = %authority, address = %addr, "Connected to origin");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(origin = %authority, address = %addr, error = %e, "Origin address refused");
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(source) => ProxyError::ConnectFailed { authority, source },
        None => ProxyError::ResolveFailed {
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses for host"),
            authority,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connects_to_listening_origin() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        let connector = OriginConnector::new(Duration::from_secs(2));
        let stream = connector.connect("127.0.0.1", &port).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap(), listener.local_addr().unwrap());
    }

    #[tokio::test]
    async fn refused_connection_is_connect_failed() {
        // bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port().to_string()
        };

        let connector = OriginConnector::new(Duration::from_secs(2));
        let err = connector.connect("127.0.0.1", &port).await.unwrap_err();
        assert!(matches!(err, ProxyError::ConnectFailed { .. }), "{err}");
        assert!(err.is_origin_failure());
    }

    #[tokio::test]
    async fn unresolvable_host_is_resolve_failed() {
        let connector = OriginConnector::new(Duration::from_secs(5));
        let err = connector.connect("no-such-host.invalid", "80").await.unwrap_err();
        assert!(
            matches!(err, ProxyError::ResolveFailed { .. } | ProxyError::Timeout { .. }),
            "{err}"
        );
    }
}
