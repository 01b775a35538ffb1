//! Bounded LRU object cache shared by all connection handlers.
//!
//! # Data Flow
//! ```text
//! handler (cache miss)
//!     → relays origin response, stages up to max_object_size + 1 bytes
//!     → insert(url, payload)        evicts LRU entries until it fits
//!
//! handler (cache hit)
//!     → lookup(url)                 promotes entry to MRU
//!     → writes Bytes clone to client
//! ```
//!
//! # Design Decisions
//! - One mutex around the whole structure; every operation is serialized
//! - Payloads are `Bytes`, so a hit hands out a cheap immutable handle that
//!   stays valid after the entry is evicted
//! - Recency order lives in `lru::LruCache`; the byte budget is tracked
//!   alongside it

mod object_cache;

pub use object_cache::ObjectCache;
