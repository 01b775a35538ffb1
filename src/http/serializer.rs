//! Upstream request rendering.

use crate::http::request::Request;

/// Render `req` as an HTTP/1.0 request head.
///
/// The request line always uses the origin-form path and `HTTP/1.0`,
/// whatever version the client spoke.
pub fn serialize(req: &Request) -> Vec<u8> {
    let mut out = Vec::with_capacity(req.head_len_hint());

    out.extend_from_slice(req.method.as_bytes());
    out.extend_from_slice(b" /");
    out.extend_from_slice(req.path.as_bytes());
    out.extend_from_slice(b" HTTP/1.0\r\n");

    for header in &req.headers {
        out.extend_from_slice(header.name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(header.value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out
}
