//! Shared Cache Module
//!
//! Thread-safe handle around a single [`Cache`].

use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::cache::{
    Cache, CacheStats, Item, ItemSnapshot, ItemStore, OrderedStore, SetOptions, Ttl,
};
use crate::error::Result;

// == Shared Cache ==
/// Cloneable, thread-safe cache handle.
///
/// Every operation runs its whole structural step (capacity check, eviction,
/// insert, recency update) under one mutex. Items removed by that step are
/// disposed after the lock is released but before the call returns, so a
/// dispose callback may use the same handle again.
pub struct SharedCache<K, V, S = OrderedStore<K, V>> {
    inner: Arc<Mutex<Cache<K, V, S>>>,
}

impl<K, V, S> Clone for SharedCache<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, S> From<Cache<K, V, S>> for SharedCache<K, V, S> {
    fn from(cache: Cache<K, V, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }
}

impl<K, V, S> SharedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: ItemStore<K, V>,
{
    // == Constructor ==
    pub fn new(cache: Cache<K, V, S>) -> Self {
        Self::from(cache)
    }

    /// The guarded cache is consistent whenever the lock is free, because
    /// no callback ever runs while it is held; a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, Cache<K, V, S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Set ==
    pub fn set(&self, key: K, value: V) -> Result<()> {
        self.set_with(key, value, SetOptions::default())
    }

    /// Same as [`Cache::set_with`], except for when dispose callbacks run.
    ///
    /// Items evicted to make room are disposed after the lock is released,
    /// so by the time a victim's callback runs the new item is already
    /// stored and visible to other handles. `Cache` instead disposes each
    /// victim inline, before the insert. The same applies to items removed
    /// by [`SharedCache::get`], [`SharedCache::delete`] and
    /// [`SharedCache::evict_expired_items`].
    pub fn set_with(&self, key: K, value: V, options: SetOptions) -> Result<()> {
        let mut retired = Vec::new();
        let result = self
            .lock()
            .insert_with(key, value, options, &mut |item: Item<V>| retired.push(item));
        dispose_all(retired);
        result
    }

    // == Get ==
    /// Returns a clone of the value if it hasn't expired by now.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get_item(key).map(|snapshot| snapshot.value)
    }

    pub fn get_at(&self, key: &K, as_of: u64) -> Option<V>
    where
        V: Clone,
    {
        self.get_item_at(key, as_of).map(|snapshot| snapshot.value)
    }

    pub fn get_item(&self, key: &K) -> Option<ItemSnapshot<V>>
    where
        V: Clone,
    {
        let now = self.lock().now_ms();
        self.get_item_at(key, now)
    }

    pub fn get_item_at(&self, key: &K, as_of: u64) -> Option<ItemSnapshot<V>>
    where
        V: Clone,
    {
        let mut retired = Vec::new();
        let snapshot = self
            .lock()
            .lookup(key, as_of, &mut |item: Item<V>| retired.push(item))
            .map(Item::snapshot);
        dispose_all(retired);
        snapshot
    }

    // == Peek ==
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.lock().peek(key).cloned()
    }

    pub fn peek_item(&self, key: &K) -> Option<ItemSnapshot<V>>
    where
        V: Clone,
    {
        self.lock().peek_item(key).map(Item::snapshot)
    }

    pub fn has(&self, key: &K) -> bool {
        self.lock().has(key)
    }

    // == Delete ==
    pub fn delete(&self, key: &K) -> bool {
        let mut retired = Vec::new();
        let removed = self
            .lock()
            .delete_with(key, &mut |item: Item<V>| retired.push(item));
        dispose_all(retired);
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // == Evict Expired ==
    pub fn evict_expired_items(&self) -> usize {
        let now = self.lock().now_ms();
        self.evict_expired_items_at(now)
    }

    pub fn evict_expired_items_at(&self, as_of: u64) -> usize {
        let mut retired = Vec::new();
        let removed = self
            .lock()
            .sweep_with(as_of, &mut |item: Item<V>| retired.push(item));
        dispose_all(retired);
        removed
    }

    // == Set TTL ==
    pub fn set_ttl(&self, key: &K, ttl: impl Into<Ttl>) -> Result<Option<u64>> {
        self.lock().set_ttl(key, ttl)
    }

    pub fn set_ttl_from(&self, key: &K, ttl: impl Into<Ttl>, from: u64) -> Result<Option<u64>> {
        self.lock().set_ttl_from(key, ttl, from)
    }

    // == Introspection ==
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn keys_by_recency(&self) -> Vec<K> {
        self.lock().keys_by_recency()
    }
}

/// Runs dispose callbacks in removal order, outside the lock.
fn dispose_all<V>(retired: Vec<Item<V>>) {
    if !retired.is_empty() {
        trace!("Disposing {} removed items", retired.len());
    }
    for item in retired {
        item.dispose();
    }
}
