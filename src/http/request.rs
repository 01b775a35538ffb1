//! In-memory model of a proxied request.
//!
//! # Responsibilities
//! - Hold the parsed request line and resolved origin (host, port, path)
//! - Keep client headers in their original order
//! - Derive the cache key and the upstream `Host` value
//!
//! # Design Decisions
//! - Port stays a string; "80" is the default and is omitted from `Host`
//! - Path is stored without its leading slash, re-added when serialized
//! - The client's own `Host` header never reaches the header list

/// Port assumed when an absolute-form target names none.
pub const DEFAULT_PORT: &str = "80";

/// A single `name: value` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// How the client spelled the request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetForm {
    /// `http://host[:port]/path`
    Absolute,
    /// `/path`, origin taken from the `Host` header.
    Relative,
}

/// A parsed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Target exactly as received.
    pub url: String,
    pub hostname: String,
    pub port: String,
    /// Path without the leading slash.
    pub path: String,
    pub version: String,
    pub headers: Vec<Header>,
    /// Value of the client's `Host` header, dropped from `headers`.
    pub client_host: Option<String>,
    pub form: TargetForm,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: String::new(),
            url: String::new(),
            hostname: String::new(),
            port: DEFAULT_PORT.to_string(),
            path: String::new(),
            version: String::new(),
            headers: Vec::new(),
            client_host: None,
            form: TargetForm::Relative,
        }
    }
}

impl Request {
    /// Only GET is forwarded; everything else gets a 501.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Value for the upstream `Host` header.
    pub fn host_header_value(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.hostname.clone()
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }

    /// `host:port` pair used to reach the origin.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Key under which the response is cached.
    ///
    /// Absolute-form targets are used verbatim. Relative-form targets are
    /// qualified with the client's `Host` value so two origins sharing a
    /// path never collide.
    pub fn cache_key(&self) -> String {
        match (self.form, &self.client_host) {
            (TargetForm::Relative, Some(host)) => format!("http://{}{}", host, self.url),
            _ => self.url.clone(),
        }
    }

    /// First header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_str())
    }

    /// Number of headers with the given name, case-insensitively.
    pub fn header_count(&self, name: &str) -> usize {
        self.headers.iter().filter(|h| h.is(name)).count()
    }

    /// Upper bound on the serialized size, used to pre-size buffers.
    pub fn head_len_hint(&self) -> usize {
        let line = self.method.len() + self.path.len() + 16;
        let headers: usize = self
            .headers
            .iter()
            .map(|h| h.name.len() + h.value.len() + 4)
            .sum();
        line + headers + 2
    }
}
