//! Backing Store Module
//!
//! The storage capability the cache sits on, and its default implementation.

use std::hash::Hash;

use hashlink::LinkedHashMap;

use crate::cache::Item;

// == Item Store Trait ==
/// Key to item mapping that remembers insertion order.
///
/// Replacing the item under an existing key keeps that key's original
/// insertion position. The cache relies on `first_key` being the oldest
/// inserted key for age-based eviction.
pub trait ItemStore<K, V> {
    fn get(&self, key: &K) -> Option<&Item<V>>;

    fn get_mut(&mut self, key: &K) -> Option<&mut Item<V>>;

    /// Stores `item` under `key`, returning the item it replaced.
    fn insert(&mut self, key: K, item: Item<V>) -> Option<Item<V>>;

    fn remove(&mut self, key: &K) -> Option<Item<V>>;

    fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oldest inserted key still present.
    fn first_key(&self) -> Option<&K>;

    /// Iterates entries in insertion order.
    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Item<V>)> + '_>;
}

// == Ordered Store ==
/// Default backing store built on a linked hash map.
pub struct OrderedStore<K, V> {
    map: LinkedHashMap<K, Item<V>>,
}

impl<K: Hash + Eq, V> OrderedStore<K, V> {
    pub fn new() -> Self {
        Self {
            map: LinkedHashMap::new(),
        }
    }

    /// Builds a pre-populated store; later duplicates replace earlier ones in place.
    pub fn from_items(items: impl IntoIterator<Item = (K, Item<V>)>) -> Self {
        let mut store = Self::new();
        for (key, item) in items {
            store.insert(key, item);
        }
        store
    }
}

impl<K: Hash + Eq, V> Default for OrderedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, Item<V>)> for OrderedStore<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, Item<V>)>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<K: Hash + Eq, V> ItemStore<K, V> for OrderedStore<K, V> {
    fn get(&self, key: &K) -> Option<&Item<V>> {
        self.map.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut Item<V>> {
        self.map.get_mut(key)
    }

    fn insert(&mut self, key: K, item: Item<V>) -> Option<Item<V>> {
        // LinkedHashMap::insert would move an existing key to the back
        if let Some(existing) = self.map.get_mut(&key) {
            return Some(std::mem::replace(existing, item));
        }
        self.map.insert(key, item);
        None
    }

    fn remove(&mut self, key: &K) -> Option<Item<V>> {
        self.map.remove(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn first_key(&self) -> Option<&K> {
        self.map.front().map(|(key, _)| key)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Item<V>)> + '_> {
        Box::new(self.map.iter())
    }
}

impl<K, V> std::fmt::Debug for OrderedStore<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}
