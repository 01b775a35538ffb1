//! Per-connection request pipeline.
//!
//! # Flow
//! ```text
//! ReadRequest ─┬─ client gone ───────────────────────────────▶ Close (Dropped)
//!              ▼
//!            Parse ── not GET ──▶ 501 ───────────────────────▶ Close (Rejected)
//!              ▼
//!           Rewrite
//!              ▼
//!         CacheLookup ── hit ──▶ write payload ──────────────▶ Close (CacheHit)
//!              ▼ miss
//!         MissForward ──▶ relay chunks + stage copy
//!              ▼ origin EOF
//!      PossiblyCacheStore ───────────────────────────────────▶ Close (Forwarded)
//! ```
//!
//! Any error returned from here is local to the connection; the caller only
//! logs it. Nothing is inserted into the cache unless the origin reached a
//! clean end-of-stream.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::cache::ObjectCache;
use crate::config::ProxyConfig;
use crate::error::{ParseError, ProxyError};
use crate::http::parser::parse_request_bytes;
use crate::http::request::Request;
use crate::http::response::not_implemented;
use crate::http::rewrite::{rewrite, RewritePolicy};
use crate::http::serializer::serialize;
use crate::net::origin::OriginConnector;
use crate::resilience::timeouts::{with_timeout, CLIENT_READ, ORIGIN_READ};

/// Size of each read from the origin.
const RELAY_CHUNK: usize = 8 * 1024;

/// Everything a connection handler needs, shared across all connections.
#[derive(Debug, Clone)]
pub struct ProxyState {
    cache: Arc<ObjectCache>,
    cache_enabled: bool,
    connector: OriginConnector,
    policy: Arc<RewritePolicy>,
    max_head_bytes: usize,
    client_read_timeout: Duration,
    origin_read_timeout: Duration,
}

impl ProxyState {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::with_cache(config, Arc::new(ObjectCache::from_config(&config.cache)))
    }

    /// Build state around an existing cache.
    pub fn with_cache(config: &ProxyConfig, cache: Arc<ObjectCache>) -> Self {
        Self {
            cache,
            cache_enabled: config.cache.enabled,
            connector: OriginConnector::new(Duration::from_secs(config.timeouts.connect_secs)),
            policy: Arc::new(RewritePolicy::new(config.upstream.user_agent.clone())),
            max_head_bytes: config.limits.max_request_head_bytes,
            client_read_timeout: Duration::from_secs(config.timeouts.client_read_secs),
            origin_read_timeout: Duration::from_secs(config.timeouts.origin_read_secs),
        }
    }

    pub fn cache(&self) -> &Arc<ObjectCache> {
        &self.cache
    }
}

/// How a connection ended, when it ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Client went away before sending a complete request head.
    Dropped,
    /// Method other than GET; answered with 501.
    Rejected,
    /// Served from cache without contacting the origin.
    CacheHit { bytes: usize },
    /// Relayed from the origin.
    Forwarded { bytes: u64, cached: bool },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Dropped => "dropped",
            Outcome::Rejected => "not_implemented",
            Outcome::CacheHit { .. } => "cache_hit",
            Outcome::Forwarded { cached: true, .. } => "forwarded_cached",
            Outcome::Forwarded { cached: false, .. } => "forwarded",
        }
    }
}

/// Run one client connection through the proxy pipeline.
pub async fn handle_connection<S>(state: &ProxyState, client: S) -> Result<Outcome, ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut client = BufReader::new(client);

    let head = with_timeout(
        CLIENT_READ,
        state.client_read_timeout,
        read_head(&mut client, state.max_head_bytes),
    )
    .await?;
    let Some(head) = head else {
        tracing::debug!("Client closed before sending a request");
        return Ok(Outcome::Dropped);
    };

    let mut req = parse_request_bytes(&head)?;
    if !req.is_get() {
        tracing::info!(method = %req.method, url = %req.url, "Rejecting unsupported method");
        send(&mut client, &not_implemented(&req.method)).await?;
        return Ok(Outcome::Rejected);
    }

    rewrite(&mut req, &state.policy)?;
    let key = req.cache_key();

    if state.cache_enabled {
        if let Some(payload) = state.cache.lookup(&key) {
            tracing::debug!(key = %key, bytes = payload.len(), "Cache hit");
            send(&mut client, &payload).await?;
            return Ok(Outcome::CacheHit {
                bytes: payload.len(),
            });
        }
        tracing::debug!(key = %key, "Cache miss");
    }

    let outcome = forward(state, &req, key, &mut client).await?;
    let _ = client.shutdown().await;
    Ok(outcome)
}

/// Write a complete response and close our side of the connection.
async fn send<W>(client: &mut W, bytes: &[u8]) -> Result<(), ProxyError>
where
    W: AsyncWrite + Unpin,
{
    client.write_all(bytes).await.map_err(ProxyError::ClientIo)?;
    let _ = client.shutdown().await;
    Ok(())
}

/// Read the request line and headers, through the terminating empty line.
///
/// Returns `None` if the client closes (or resets) before the head is
/// complete. Blank lines before the request line are skipped.
async fn read_head<R>(reader: &mut R, limit: usize) -> Result<Option<Vec<u8>>, ProxyError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = Vec::new();
    loop {
        let remaining = limit.saturating_sub(head.len());
        if remaining == 0 {
            return Err(ParseError::HeadTooLarge { limit }.into());
        }

        let start = head.len();
        let read = (&mut *reader)
            .take(remaining as u64)
            .read_until(b'\n', &mut head)
            .await;
        let n = match read {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof) => {
                return Ok(None)
            }
            Err(e) => return Err(ProxyError::ClientIo(e)),
        };
        if n == 0 {
            return Ok(None);
        }

        let line = &head[start..];
        if !line.ends_with(b"\n") {
            if head.len() >= limit {
                return Err(ParseError::HeadTooLarge { limit }.into());
            }
            return Ok(None);
        }

        if line == b"\r\n" || line == b"\n" {
            if start == 0 {
                head.clear();
                continue;
            }
            return Ok(Some(head));
        }
    }
}

/// Fetch from the origin, relaying to the client and caching if small enough.
async fn forward<C>(
    state: &ProxyState,
    req: &Request,
    key: String,
    client: &mut C,
) -> Result<Outcome, ProxyError>
where
    C: AsyncWrite + Unpin,
{
    let mut origin = state.connector.connect(&req.hostname, &req.port).await?;
    origin
        .write_all(&serialize(req))
        .await
        .map_err(ProxyError::OriginReset)?;

    let mut staging = StagingBuffer::new(state.cache.max_object_size());
    let mut chunk = vec![0u8; RELAY_CHUNK];
    let mut relayed: u64 = 0;

    loop {
        let n = with_timeout(ORIGIN_READ, state.origin_read_timeout, async {
            origin.read(&mut chunk).await.map_err(ProxyError::OriginReset)
        })
        .await?;
        if n == 0 {
            break;
        }

        client
            .write_all(&chunk[..n])
            .await
            .map_err(ProxyError::ClientIo)?;
        staging.push(&chunk[..n]);
        relayed += n as u64;
    }

    let cached = match staging.into_payload() {
        Some(payload) if state.cache_enabled && !payload.is_empty() => {
            state.cache.insert(key.clone(), payload)
        }
        _ => false,
    };

    tracing::debug!(
        key = %key,
        origin = %req.authority(),
        bytes = relayed,
        cached,
        "Relayed origin response"
    );
    Ok(Outcome::Forwarded {
        bytes: relayed,
        cached,
    })
}

/// Copy of a response kept only while it could still fit in the cache.
#[derive(Debug)]
struct StagingBuffer {
    buf: BytesMut,
    cap: usize,
    overflowed: bool,
}

impl StagingBuffer {
    fn new(cap: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            cap,
            overflowed: false,
        }
    }

    fn push(&mut self, data: &[u8]) {
        if self.overflowed {
            return;
        }
        if self.buf.len() + data.len() > self.cap {
            self.overflowed = true;
            self.buf = BytesMut::new();
            return;
        }
        self.buf.extend_from_slice(data);
    }

    /// The staged response, or `None` if it grew past the cap.
    fn into_payload(self) -> Option<Bytes> {
        if self.overflowed {
            None
        } else {
            Some(self.buf.freeze())
        }
    }
}
