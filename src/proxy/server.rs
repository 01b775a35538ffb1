//! Proxy server: accept loop and per-connection task spawning.
//!
//! # Responsibilities
//! - Accept client connections until shutdown is signalled
//! - Spawn one task per connection, each inside its own tracing span
//! - Log and count the outcome of every connection
//! - Drain in-flight connections on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::cache::ObjectCache;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::Listener;
use crate::observability::metrics;
use crate::proxy::handler::{handle_connection, Outcome, ProxyState};

/// Back-off after a failed accept (e.g. out of file descriptors).
const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(50);

/// The caching forward proxy.
pub struct ProxyServer {
    state: ProxyState,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl ProxyServer {
    /// Create a new proxy server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            state: ProxyState::from_config(&config),
            tracker: ConnectionTracker::new(),
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        }
    }

    /// The shared object cache.
    pub fn cache(&self) -> Arc<ObjectCache> {
        Arc::clone(self.state.cache())
    }

    /// Live connection tracking.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal arrives.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy server starting");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_DELAY).await;
                    }
                },
            }
        }

        let remaining = self.tracker.wait_for_shutdown(self.shutdown_grace).await;
        if remaining > 0 {
            tracing::warn!(remaining, "Shutdown grace period elapsed with connections still open");
        }
        tracing::info!("Proxy server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let guard = self.tracker.track();
        let state = self.state.clone();
        let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);

        tokio::spawn(
            async move {
                let _guard = guard;
                let start = Instant::now();
                let _ = stream.set_nodelay(true);
                let result = handle_connection(&state, stream).await;
                report(&result, start);
            }
            .instrument(span),
        );
    }
}

fn report(result: &Result<Outcome, ProxyError>, start: Instant) {
    match result {
        Ok(outcome) => {
            tracing::debug!(outcome = outcome.label(), elapsed = ?start.elapsed(), "Connection finished");
            metrics::record_request(outcome.label(), start);
        }
        Err(e @ ProxyError::ClientIo(_)) => {
            tracing::debug!(error = %e, "Client went away");
            metrics::record_request(e.kind(), start);
        }
        Err(e) => {
            if e.is_origin_failure() {
                metrics::record_origin_error(e.kind());
            }
            tracing::warn!(error = %e, kind = e.kind(), "Connection aborted");
            metrics::record_request(e.kind(), start);
        }
    }
}
