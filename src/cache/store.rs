//! Cache Store Module
//!
//! Main cache engine combining the backing item store with recency tracking,
//! TTL expiration and capacity eviction.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::cache::stats::RemovalCause;
use crate::cache::{
    CacheStats, Clock, DisposeFn, Item, ItemStore, OrderedStore, SystemClock, Ttl, UsageOrder,
};
use crate::config::{CacheConfig, EvictionStrategy};
use crate::error::{CacheError, Result};

// == Set Options ==
/// Per-write overrides for [`Cache::set_with`].
#[derive(Default)]
pub struct SetOptions {
    ttl: Option<Ttl>,
    stored_at: Option<u64>,
    dispose: Option<DisposeFn>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime of this item instead of the cache default. Must be positive.
    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Backdates (or postdates) the storage timestamp.
    pub fn stored_at(mut self, timestamp_ms: u64) -> Self {
        self.stored_at = Some(timestamp_ms);
        self
    }

    /// Callback run once when the item is deleted, evicted or expired.
    pub fn on_dispose(mut self, dispose: impl FnOnce() + Send + 'static) -> Self {
        self.dispose = Some(Box::new(dispose));
        self
    }
}

impl fmt::Debug for SetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetOptions")
            .field("ttl", &self.ttl)
            .field("stored_at", &self.stored_at)
            .field("has_dispose", &self.dispose.is_some())
            .finish()
    }
}

// == Cache ==
/// Bounded key-value cache with per-item TTL and age or LRU eviction.
///
/// The backing store and the usage order always hold the same key set. Every
/// path that removes an item detaches it from both before its dispose
/// callback runs.
pub struct Cache<K, V, S = OrderedStore<K, V>> {
    /// Key to item storage, in insertion order
    store: S,
    /// Recency tracker
    order: UsageOrder<K>,
    /// Performance statistics
    stats: CacheStats,
    default_ttl: Ttl,
    max_items: Option<usize>,
    eviction: EvictionStrategy,
    clock: Arc<dyn Clock>,
    _values: PhantomData<fn() -> V>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty cache.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_store(config, OrderedStore::new())
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: ItemStore<K, V>,
{
    /// Creates a cache on top of a caller-supplied store.
    ///
    /// Items already in the store are tracked as used in their insertion
    /// order. If the store holds more items than `max_items`, the surplus is
    /// evicted (and disposed) right away.
    pub fn with_store(config: CacheConfig, store: S) -> Result<Self> {
        config.validate()?;

        let mut order = UsageOrder::with_capacity(store.len());
        for (key, _) in store.iter() {
            order.push(key.clone());
        }

        let mut cache = Self {
            store,
            order,
            stats: CacheStats::new(),
            default_ttl: config.default_ttl,
            max_items: config.max_items,
            eviction: config.eviction,
            clock: Arc::new(SystemClock),
            _values: PhantomData,
        };

        if let Some(max_items) = cache.max_items {
            let evicted = cache.evict_until(max_items, &mut Item::dispose);
            if evicted > 0 {
                warn!(
                    "Backing store exceeded capacity, evicted {} items",
                    evicted
                );
            }
        }

        info!(
            max_items = ?cache.max_items,
            default_ttl = ?cache.default_ttl,
            eviction = %cache.eviction,
            items = cache.len(),
            "Cache initialized"
        );
        Ok(cache)
    }

    /// Replaces the time source used when no explicit timestamp is given.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    // == Set ==
    /// Stores a value with the default TTL.
    ///
    /// See [`Cache::set_with`].
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        self.set_with(key, value, SetOptions::default())
    }

    /// Stores a value, evicting items first if the cache is full.
    ///
    /// An explicit TTL of zero or less is rejected with
    /// [`CacheError::InvalidTtl`] and leaves the cache untouched.
    ///
    /// Overwriting a key replaces its item without disposing the old one, and
    /// keeps the key's insertion position for age-based eviction.
    pub fn set_with(&mut self, key: K, value: V, options: SetOptions) -> Result<()> {
        self.insert_with(key, value, options, &mut Item::dispose)
    }

    pub(crate) fn insert_with<F>(
        &mut self,
        key: K,
        value: V,
        options: SetOptions,
        retire: &mut F,
    ) -> Result<()>
    where
        F: FnMut(Item<V>),
    {
        let ttl = match options.ttl {
            Some(ttl) => ttl.checked()?,
            None => self.default_ttl,
        };
        let stored_at = options
            .stored_at
            .unwrap_or_else(|| self.clock.now_ms());
        let expires_at = ttl.expires_at(stored_at);

        if let Some(max_items) = self.max_items {
            // Loop inside evict_until: one eviction is not always enough
            self.evict_until(max_items - 1, retire);
        }

        let item = Item::from_parts(value, stored_at, expires_at, options.dispose);
        if self.store.insert(key.clone(), item).is_some() {
            trace!("Overwrote existing item without disposing it");
        }
        if !self.order.touch(&key) {
            self.order.push(key);
        }
        Ok(())
    }

    // == Peek ==
    /// Returns the item without checking its TTL or updating recency.
    pub fn peek_item(&self, key: &K) -> Option<&Item<V>> {
        self.store.get(key)
    }

    /// Returns the value without checking its TTL or updating recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.peek_item(key).map(Item::value)
    }

    // == Get ==
    /// Returns the item if it hasn't expired by now, marking it most recently used.
    pub fn get_item(&mut self, key: &K) -> Option<&Item<V>> {
        let now = self.clock.now_ms();
        self.get_item_at(key, now)
    }

    /// Returns the item if it hasn't expired by `as_of`, marking it most
    /// recently used.
    ///
    /// An expired item is deleted (and disposed) and reported as absent.
    pub fn get_item_at(&mut self, key: &K, as_of: u64) -> Option<&Item<V>> {
        self.lookup(key, as_of, &mut Item::dispose)
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_item(key).map(Item::value)
    }

    pub fn get_at(&mut self, key: &K, as_of: u64) -> Option<&V> {
        self.get_item_at(key, as_of).map(Item::value)
    }

    pub(crate) fn lookup<F>(&mut self, key: &K, as_of: u64, retire: &mut F) -> Option<&Item<V>>
    where
        F: FnMut(Item<V>),
    {
        let expired = match self.store.get(key) {
            Some(item) => item.is_expired_at(as_of),
            None => {
                self.stats.record_lookup(false);
                trace!("Cache miss");
                return None;
            }
        };

        if expired {
            if let Some(item) = self.detach(key) {
                self.stats.record_removal(RemovalCause::Expired);
                debug!(as_of, "Expired item removed on access");
                retire(item);
            }
            self.stats.record_lookup(false);
            return None;
        }

        self.order.touch(key);
        self.stats.record_lookup(true);
        trace!("Cache hit");
        self.store.get(key)
    }

    // == Has ==
    /// Checks presence only; expired items still count until removed.
    pub fn has(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    // == Delete ==
    /// Removes an item, running its dispose callback.
    ///
    /// Returns false if the key was not tracked.
    pub fn delete(&mut self, key: &K) -> bool {
        self.delete_with(key, &mut Item::dispose)
    }

    pub(crate) fn delete_with<F>(&mut self, key: &K, retire: &mut F) -> bool
    where
        F: FnMut(Item<V>),
    {
        match self.detach(key) {
            Some(item) => {
                retire(item);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Drops every item. Dispose callbacks are not run.
    pub fn clear(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        self.order.clear();
        debug!("Cache cleared, dropped {} items", dropped);
    }

    // == Evict Expired ==
    /// Removes every item that has expired by now.
    ///
    /// Returns the number of items removed.
    pub fn evict_expired_items(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.evict_expired_items_at(now)
    }

    /// Removes every item whose expiry timestamp is at or before `as_of`.
    ///
    /// Each item is detached and disposed before the next one is looked at.
    /// Items that are not due keep their recency position.
    pub fn evict_expired_items_at(&mut self, as_of: u64) -> usize {
        self.sweep_with(as_of, &mut Item::dispose)
    }

    pub(crate) fn sweep_with<F>(&mut self, as_of: u64, retire: &mut F) -> usize
    where
        F: FnMut(Item<V>),
    {
        let due: Vec<K> = self
            .store
            .iter()
            .filter(|(_, item)| item.is_expired_at(as_of))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0;
        for key in due {
            if let Some(item) = self.detach(&key) {
                removed += 1;
                self.stats.record_removal(RemovalCause::Expired);
                retire(item);
            }
        }

        if removed > 0 {
            debug!(as_of, "Sweep removed {} expired items", removed);
        } else {
            trace!(as_of, "Sweep found no expired items");
        }
        removed
    }

    // == Set TTL ==
    /// Restarts an item's lifetime from now.
    ///
    /// See [`Cache::set_ttl_from`].
    pub fn set_ttl(&mut self, key: &K, ttl: impl Into<Ttl>) -> Result<Option<u64>> {
        let now = self.clock.now_ms();
        self.set_ttl_from(key, ttl, now)
    }

    /// Sets an item's expiry to `from + ttl`, whatever it was before.
    ///
    /// Returns the new expiry timestamp (`None` for [`Ttl::Never`]), or
    /// [`CacheError::KeyNotFound`] if the key is not tracked. Recency is
    /// not affected.
    pub fn set_ttl_from(&mut self, key: &K, ttl: impl Into<Ttl>, from: u64) -> Result<Option<u64>> {
        let item = self.store.get_mut(key).ok_or(CacheError::KeyNotFound)?;
        let expires_at = ttl.into().expires_at(from);
        item.set_expires_at(expires_at);
        Ok(expires_at)
    }

    // == Length ==
    /// Returns the current number of items, expired ones included until removed.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.store.len())
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::new();
    }

    // == Introspection ==
    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.order.iter().cloned().collect()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.store.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Read-only access to the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn default_ttl(&self) -> Ttl {
        self.default_ttl
    }

    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    pub fn eviction(&self) -> EvictionStrategy {
        self.eviction
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Internals ==
    /// Removes a key from both structures without disposing its item.
    fn detach(&mut self, key: &K) -> Option<Item<V>> {
        let item = self.store.remove(key);
        self.order.delete(key);
        item
    }

    /// Evicts per the configured strategy until at most `limit` items remain.
    ///
    /// Size is re-read on every iteration.
    fn evict_until<F>(&mut self, limit: usize, retire: &mut F) -> usize
    where
        F: FnMut(Item<V>),
    {
        let mut evicted = 0;
        while self.store.len() > limit {
            let victim = match self.eviction {
                EvictionStrategy::Age => self.store.first_key().cloned(),
                EvictionStrategy::Lru => self.order.shift(),
            };
            let Some(victim) = victim else {
                warn!(
                    items = self.store.len(),
                    "No eviction candidate while over capacity"
                );
                break;
            };
            if let Some(item) = self.detach(&victim) {
                evicted += 1;
                self.stats.record_removal(RemovalCause::Evicted);
                retire(item);
            }
        }
        if evicted > 0 {
            debug!(strategy = %self.eviction, "Evicted {} items for capacity", evicted);
        }
        evicted
    }
}

impl<K, V, S> fmt::Debug for Cache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("default_ttl", &self.default_ttl)
            .field("max_items", &self.max_items)
            .field("eviction", &self.eviction)
            .field("stats", &self.stats)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
