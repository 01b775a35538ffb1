//! Caching HTTP/1.0 forward proxy library.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;

pub use cache::ObjectCache;
pub use config::schema::ProxyConfig;
pub use error::{ParseError, ProxyError};
pub use lifecycle::Shutdown;
pub use proxy::ProxyServer;
