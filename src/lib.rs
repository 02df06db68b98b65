//! Expiring Cache - An in-process key-value cache
//!
//! Bounded capacity, per-item TTL with lazy expiry, and age or LRU eviction.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, Item, ItemStore, OrderedStore, SetOptions, SharedCache, Ttl};
pub use config::{CacheConfig, EvictionStrategy};
pub use error::{CacheError, Result};
