//! Proxy header policy.
//!
//! After rewriting, a request carries exactly one `Host`, `User-Agent`,
//! `Connection` and `Proxy-Connection`, appended after the client's own
//! headers in that order.

use crate::config::schema::DEFAULT_USER_AGENT;
use crate::error::ParseError;
use crate::http::parser::{is_reserved, split_authority};
use crate::http::request::{Header, Request, TargetForm};

/// Values the proxy forces onto every upstream request.
#[derive(Debug, Clone)]
pub struct RewritePolicy {
    pub user_agent: String,
}

impl RewritePolicy {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Default for RewritePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

/// Resolve the origin and apply the reserved headers in place.
///
/// Running this twice leaves the request unchanged the second time.
pub fn rewrite(req: &mut Request, policy: &RewritePolicy) -> Result<(), ParseError> {
    if req.form == TargetForm::Relative && req.hostname.is_empty() {
        resolve_from_host_header(req)?;
    }

    req.headers.retain(|h| !is_reserved(&h.name));

    let host = req.host_header_value();
    req.headers.push(Header::new("Host", host));
    req.headers.push(Header::new("User-Agent", policy.user_agent.as_str()));
    req.headers.push(Header::new("Connection", "close"));
    req.headers.push(Header::new("Proxy-Connection", "close"));
    Ok(())
}

fn resolve_from_host_header(req: &mut Request) -> Result<(), ParseError> {
    let client_host = req
        .client_host
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ParseError::MissingHost(req.url.clone()))?;

    let (hostname, port) = split_authority(client_host)?;
    if hostname.is_empty() {
        return Err(ParseError::EmptyHost(client_host.to_string()));
    }
    req.hostname = hostname.to_string();
    req.port = port.to_string();
    Ok(())
}
