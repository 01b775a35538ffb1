//! Responses synthesized by the proxy itself.
//!
//! Everything the origin sends is relayed untouched; the only page the
//! proxy writes on its own is the 501 for unsupported methods.

/// Build the `501 Not Implemented` page for `method`.
pub fn not_implemented(method: &str) -> Vec<u8> {
    error_page("501", "Not Implemented", &format!("Proxy does not implement this method: {method}"))
}

fn error_page(status: &str, reason: &str, detail: &str) -> Vec<u8> {
    let body = format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {status}: {reason}\r\n\
         <p>{detail}\r\n\
         <hr><em>The caching proxy</em>\r\n\
         </body></html>\r\n",
        detail = escape_html(detail),
    );

    let mut out = format!(
        "HTTP/1.0 {status} {reason}\r\n\
         Content-type: text/html\r\n\
         Content-length: {}\r\n\
         \r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
