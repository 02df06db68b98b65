//! Usage Order Module
//!
//! Tracks recency of use for LRU eviction.

use std::collections::HashMap;
use std::hash::Hash;

/// Null link in the node arena.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K> {
    /// `None` while the slot sits on the free list
    key: Option<K>,
    prev: usize,
    next: usize,
}

// == Usage Order ==
/// Recency-ordered set of keys.
///
/// Nodes live in a `Vec` arena and link to each other by index; a
/// `HashMap<K, usize>` maps each key to its slot, so every operation is O(1):
/// - Head = least recently used
/// - Tail = most recently used
///
/// Freed slots are chained through `next` and reused by later pushes.
#[derive(Debug)]
pub struct UsageOrder<K> {
    slots: HashMap<K, usize>,
    nodes: Vec<Node<K>>,
    head: usize,
    tail: usize,
    free: usize,
}

impl<K> Default for UsageOrder<K> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            nodes: Vec::new(),
            head: NIL,
            tail: NIL,
            free: NIL,
        }
    }
}

impl<K: Hash + Eq + Clone> UsageOrder<K> {
    // == Constructor ==
    /// Creates a new empty usage order.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    // == Push ==
    /// Adds an untracked key as the most recently used one.
    ///
    /// Pushing a key that is already tracked only promotes it.
    pub fn push(&mut self, key: K) {
        if self.touch(&key) {
            return;
        }
        let idx = self.alloc(key.clone());
        self.link_back(idx);
        self.slots.insert(key, idx);
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// Returns false (and does nothing) if the key is not tracked.
    pub fn touch(&mut self, key: &K) -> bool {
        let Some(&idx) = self.slots.get(key) else {
            return false;
        };
        if idx != self.tail {
            self.unlink(idx);
            self.link_back(idx);
        }
        true
    }

    // == Shift ==
    /// Removes and returns the least recently used key.
    ///
    /// Returns None if nothing is tracked.
    pub fn shift(&mut self) -> Option<K> {
        if self.head == NIL {
            return None;
        }
        let idx = self.head;
        self.unlink(idx);
        let key = self.nodes[idx].key.take()?;
        self.slots.remove(&key);
        self.release(idx);
        Some(key)
    }

    // == Delete ==
    /// Stops tracking a key. Returns whether it was tracked.
    pub fn delete(&mut self, key: &K) -> bool {
        let Some(idx) = self.slots.remove(key) else {
            return false;
        };
        self.unlink(idx);
        self.nodes[idx].key = None;
        self.release(idx);
        true
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.slots.clear();
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.nodes.get(self.head).and_then(|node| node.key.as_ref())
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            nodes: &self.nodes,
            current: self.head,
            remaining: self.slots.len(),
        }
    }

    // == Arena Internals ==
    fn alloc(&mut self, key: K) -> usize {
        let node = Node {
            key: Some(key),
            prev: NIL,
            next: NIL,
        };
        if self.free == NIL {
            self.nodes.push(node);
            self.nodes.len() - 1
        } else {
            let idx = self.free;
            self.free = self.nodes[idx].next;
            self.nodes[idx] = node;
            idx
        }
    }

    fn release(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.free;
        self.free = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);

        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }

        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn link_back(&mut self, idx: usize) {
        self.nodes[idx].prev = self.tail;
        self.nodes[idx].next = NIL;

        if self.tail == NIL {
            self.head = idx;
        } else {
            self.nodes[self.tail].next = idx;
        }
        self.tail = idx;
    }
}

// == Iterator ==
/// Keys in recency order, least recently used first.
pub struct Iter<'a, K> {
    nodes: &'a [Node<K>],
    current: usize,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.current)?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        node.key.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order_of(order: &UsageOrder<&'static str>) -> Vec<&'static str> {
        order.iter().copied().collect()
    }

    #[test]
    fn test_order_new() {
        let order: UsageOrder<String> = UsageOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
        assert_eq!(order.peek_oldest(), None);
    }

    #[test]
    fn test_push_appends_most_recent() {
        let mut order = UsageOrder::new();

        order.push("key1");
        order.push("key2");
        order.push("key3");

        assert_eq!(order.len(), 3);
        // key1 is oldest (added first)
        assert_eq!(order.peek_oldest(), Some(&"key1"));
        assert_eq!(order_of(&order), vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn test_push_tracked_key_promotes() {
        let mut order = UsageOrder::new();
        order.push("a");
        order.push("b");
        order.push("a");

        assert_eq!(order.len(), 2);
        assert_eq!(order_of(&order), vec!["b", "a"]);
    }

    #[test]
    fn test_touch_existing_key() {
        let mut order = UsageOrder::new();

        order.push("key1");
        order.push("key2");
        order.push("key3");

        assert!(order.touch(&"key1"));

        assert_eq!(order.len(), 3);
        assert_eq!(order.peek_oldest(), Some(&"key2"));
        assert_eq!(order_of(&order), vec!["key2", "key3", "key1"]);
    }

    #[test]
    fn test_touch_untracked_is_noop() {
        let mut order = UsageOrder::new();
        order.push("key1");

        assert!(!order.touch(&"missing"));
        assert_eq!(order_of(&order), vec!["key1"]);
    }

    #[test]
    fn test_touch_tail_keeps_order() {
        let mut order = UsageOrder::new();
        order.push("a");
        order.push("b");

        assert!(order.touch(&"b"));
        assert_eq!(order_of(&order), vec!["a", "b"]);
    }

    #[test]
    fn test_shift_in_lru_order() {
        let mut order = UsageOrder::new();

        order.push("key1");
        order.push("key2");
        order.push("key3");

        assert_eq!(order.shift(), Some("key1"));
        assert_eq!(order.len(), 2);

        assert_eq!(order.shift(), Some("key2"));
        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_shift_empty() {
        let mut order: UsageOrder<&str> = UsageOrder::new();
        assert_eq!(order.shift(), None);
    }

    #[test]
    fn test_delete() {
        let mut order = UsageOrder::new();

        order.push("key1");
        order.push("key2");
        order.push("key3");

        assert!(order.delete(&"key2"));

        assert_eq!(order.len(), 2);
        assert!(!order.contains(&"key2"));
        assert_eq!(order_of(&order), vec!["key1", "key3"]);
    }

    #[test]
    fn test_delete_nonexistent_key() {
        let mut order = UsageOrder::new();

        order.push("key1");
        order.push("key2");

        assert!(!order.delete(&"nonexistent"));

        assert_eq!(order.len(), 2);
        assert!(order.contains(&"key1"));
        assert!(order.contains(&"key2"));
    }

    #[test]
    fn test_delete_head_and_tail() {
        let mut order = UsageOrder::new();
        order.push("a");
        order.push("b");
        order.push("c");

        order.delete(&"a");
        order.delete(&"c");

        assert_eq!(order_of(&order), vec!["b"]);
        assert_eq!(order.shift(), Some("b"));
        assert!(order.is_empty());
    }

    #[test]
    fn test_order_after_multiple_touches() {
        let mut order = UsageOrder::new();

        order.push("a");
        order.push("b");
        order.push("c");

        order.touch(&"a");
        order.touch(&"c");
        order.touch(&"b");

        assert_eq!(order.shift(), Some("a"));
        assert_eq!(order.shift(), Some("c"));
        assert_eq!(order.shift(), Some("b"));
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut order = UsageOrder::new();
        order.push("a");
        order.push("b");
        order.push("c");

        order.delete(&"b");
        order.shift();
        order.push("d");
        order.push("e");

        assert_eq!(order.nodes.len(), 3);
        assert_eq!(order_of(&order), vec!["c", "d", "e"]);
    }

    #[test]
    fn test_clear() {
        let mut order = UsageOrder::new();
        order.push("a");
        order.push("b");

        order.clear();

        assert!(order.is_empty());
        assert_eq!(order.shift(), None);

        order.push("c");
        assert_eq!(order_of(&order), vec!["c"]);
    }

    #[test]
    fn test_iter_size_hint() {
        let mut order = UsageOrder::new();
        order.push(1);
        order.push(2);

        assert_eq!(order.iter().size_hint(), (2, Some(2)));
        assert_eq!(order.iter().count(), 2);
    }
}
