//! Cache Statistics Module
//!
//! Counters for lookup outcomes and for items the cache removed on its own.

use serde::Serialize;

/// Why the cache removed an item without being asked to.
///
/// Explicit deletes and `clear()` are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RemovalCause {
    /// Dropped to make room under the capacity bound
    Evicted,
    /// Found past its expiry on a read or a sweep
    Expired,
}

// == Cache Stats ==
/// Point-in-time view of cache counters.
///
/// A read that finds an expired item counts as a miss and as an expiration.
/// `peek` and `has` are not lookups and leave the counters alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Items removed for capacity
    pub evictions: u64,
    /// Items removed because their TTL elapsed
    pub expirations: u64,
    /// Items held when the snapshot was taken, expired ones included
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` style reads recorded.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// hits / lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    /// Items the cache dropped by itself, evicted or expired.
    pub fn removals(&self) -> u64 {
        self.evictions + self.expirations
    }

    pub(crate) fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub(crate) fn record_removal(&mut self, cause: RemovalCause) {
        match cause {
            RemovalCause::Evicted => self.evictions += 1,
            RemovalCause::Expired => self.expirations += 1,
        }
    }

    /// Copy of the counters stamped with the current entry count.
    pub(crate) fn snapshot(&self, total_entries: usize) -> Self {
        Self {
            total_entries,
            ..self.clone()
        }
    }
}
