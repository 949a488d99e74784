//! Cache module for storing raw HTTP responses on disk
//!
//! This module provides a read-through cache keyed by request URL. Every
//! response fetched through it is kept in memory and the full map is
//! persisted to a single JSON file, so later runs reuse earlier responses
//! instead of hitting the network again.

mod store;

pub use store::{default_cache_path, CacheError, CacheStore};
