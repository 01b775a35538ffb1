//! Request head parsing.
//!
//! # Responsibilities
//! - Split the request line into method, target, version
//! - Resolve hostname/port/path from absolute-form targets
//! - Collect client headers, dropping the four the proxy re-injects
//!
//! # Design Decisions
//! - Non-GET requests stop after the request line; the handler answers 501
//! - Lines may end in CRLF or bare LF
//! - Everything is owned `String`s; there is no fixed line limit here

use crate::error::ParseError;
use crate::http::request::{Header, Request, TargetForm, DEFAULT_PORT};

/// Headers the proxy always replaces with its own values.
pub const RESERVED_HEADERS: [&str; 4] = ["Host", "User-Agent", "Connection", "Proxy-Connection"];

const HTTP_SCHEME: &str = "http://";

/// Returns true if `name` is one of the headers the proxy owns.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_HEADERS.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Parse a raw request head (request line plus header block).
pub fn parse_request_bytes(head: &[u8]) -> Result<Request, ParseError> {
    let text = std::str::from_utf8(head).map_err(|_| ParseError::NotUtf8)?;
    parse_request(text)
}

/// Parse a request head held as text.
pub fn parse_request(head: &str) -> Result<Request, ParseError> {
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();

    let mut tokens = request_line.split_whitespace();
    let (method, url, version) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(m), Some(u), Some(v)) => (m, u, v),
        _ => return Err(ParseError::IncompleteRequestLine(request_line.to_string())),
    };

    let mut req = Request {
        method: method.to_string(),
        url: url.to_string(),
        version: version.to_string(),
        ..Request::default()
    };

    if !req.is_get() {
        return Ok(req);
    }

    if has_http_scheme(url) {
        parse_absolute(&mut req)?;
    } else {
        parse_relative(&mut req);
    }

    for line in lines {
        if line.is_empty() {
            break;
        }
        parse_header(line, &mut req)?;
    }

    Ok(req)
}

fn has_http_scheme(url: &str) -> bool {
    url.get(..HTTP_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(HTTP_SCHEME))
}

/// `http://host[:port][/path]`
fn parse_absolute(req: &mut Request) -> Result<(), ParseError> {
    req.form = TargetForm::Absolute;
    let rest = &req.url[HTTP_SCHEME.len()..];

    let (authority, path) = match rest.split_once('/') {
        Some((authority, path)) => (authority, path),
        None => (rest, ""),
    };

    let (hostname, port) = split_authority(authority)?;
    if hostname.is_empty() {
        return Err(ParseError::EmptyHost(req.url.clone()));
    }

    req.hostname = hostname.to_string();
    req.port = port.to_string();
    req.path = path.to_string();
    Ok(())
}

/// `/path`; the origin comes from the `Host` header later.
fn parse_relative(req: &mut Request) {
    req.form = TargetForm::Relative;
    req.path = req.url.strip_prefix('/').unwrap_or(&req.url).to_string();
}

/// Split `host[:port]`, defaulting the port to 80.
pub(crate) fn split_authority(authority: &str) -> Result<(&str, &str), ParseError> {
    match authority.split_once(':') {
        Some((host, port)) => {
            if port.parse::<u16>().is_err() {
                return Err(ParseError::InvalidPort(port.to_string()));
            }
            Ok((host, port))
        }
        None => Ok((authority, DEFAULT_PORT)),
    }
}

fn parse_header(line: &str, req: &mut Request) -> Result<(), ParseError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::MalformedHeader(line.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::MalformedHeader(line.to_string()));
    }
    let value = value.trim();

    if is_reserved(name) {
        if name.eq_ignore_ascii_case("Host") && req.client_host.is_none() {
            req.client_host = Some(value.to_string());
        }
        return Ok(());
    }

    req.headers.push(Header::new(name, value));
    Ok(())
}
