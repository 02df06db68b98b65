//! Cache Module
//!
//! Provides the in-memory cache with TTL expiration and age or LRU eviction.

mod backing;
mod clock;
mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use backing::{ItemStore, OrderedStore};
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{DisposeFn, Item, ItemSnapshot, Ttl};
pub use lru::{Iter as UsageOrderIter, UsageOrder};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::{Cache, SetOptions};
