//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes and timeouts > 0, addresses parse)
//! - Check cache limits are consistent with each other
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `cache.max_object_size`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration for values the proxy cannot run with.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let cache = &config.cache;
    if cache.max_cache_size == 0 {
        errors.push(ValidationError::new("cache.max_cache_size", "must be greater than zero"));
    }
    if cache.max_object_size == 0 {
        errors.push(ValidationError::new("cache.max_object_size", "must be greater than zero"));
    }
    if cache.max_object_size > cache.max_cache_size {
        errors.push(ValidationError::new(
            "cache.max_object_size",
            format!(
                "{} exceeds cache.max_cache_size ({})",
                cache.max_object_size, cache.max_cache_size
            ),
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.client_read_secs", timeouts.client_read_secs),
        ("timeouts.origin_read_secs", timeouts.origin_read_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if config.limits.max_request_head_bytes == 0 {
        errors.push(ValidationError::new(
            "limits.max_request_head_bytes",
            "must be greater than zero",
        ));
    }

    let agent = &config.upstream.user_agent;
    if agent.trim().is_empty() || agent.contains(['\r', '\n']) {
        errors.push(ValidationError::new(
            "upstream.user_agent",
            "must be a non-empty single line",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
