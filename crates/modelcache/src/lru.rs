//! LRU (Least Recently Used) index
//!
//! Uses an intrusive linked list over a slab for O(1) promotion and eviction.
//! The hash index and the recency list live in one structure, so they always
//! hold the same key set.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// What a `put` displaced
#[derive(Debug, PartialEq, Eq)]
pub enum PutOutcome<K, V> {
    /// Key was new and there was room
    Inserted,
    /// Key was present; its previous value is returned
    Replaced(V),
    /// Key was new and the least recently used entry was evicted to make room
    Evicted(K, V),
}

/// LRU index with fixed capacity
///
/// Head is the most recently used entry, tail the least recently used.
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU index with the given capacity
    ///
    /// # Panics
    /// Panics if `capacity` is 0. `CacheStore` validates its config first.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Get a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Get a value without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check presence without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or overwrite a key, marking it most recently used
    ///
    /// Evicts at most one entry, and only when the key is new and the index is full.
    pub fn put(&mut self, key: K, value: V) -> PutOutcome<K, V> {
        if let Some(&idx) = self.map.get(&key) {
            self.move_to_front(idx);
            return match &mut self.nodes[idx] {
                Some(node) => PutOutcome::Replaced(std::mem::replace(&mut node.value, value)),
                None => PutOutcome::Inserted,
            };
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.map.insert(key, idx);

        match evicted {
            Some((k, v)) => PutOutcome::Evicted(k, v),
            None => PutOutcome::Inserted,
        }
    }

    /// Remove a key
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        self.free_node(idx);
        self.nodes[idx].take().map(|node| node.value)
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys ordered least recently used first
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            match &self.nodes[idx] {
                Some(node) => {
                    keys.push(node.key.clone());
                    cursor = node.prev;
                }
                None => break,
            }
        }
        keys
    }

    /// Remove every entry, returning the values
    pub fn drain(&mut self) -> Vec<V> {
        let values = self
            .nodes
            .drain(..)
            .flatten()
            .map(|node| node.value)
            .collect();
        self.map.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        values
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let tail_idx = self.tail?;
        // Unlink while the node is still in its slot so neighbours get patched.
        self.unlink(tail_idx);
        let node = self.nodes[tail_idx].take()?;
        self.map.remove(&node.key);
        self.free_node(tail_idx);
        Some((node.key, node.value))
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    fn free_node(&mut self, idx: usize) {
        self.free_list.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2);

        assert_eq!(cache.put(1, "a"), PutOutcome::Inserted);
        assert_eq!(cache.put(2, "b"), PutOutcome::Inserted);

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a");
        cache.put(2, "b");
        assert_eq!(cache.put(3, "c"), PutOutcome::Evicted(1, "a"));

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_update() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a");
        cache.put(2, "b");
        cache.get(&1); // Move 1 to front
        assert_eq!(cache.put(3, "c"), PutOutcome::Evicted(2, "b"));

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a");
        cache.put(2, "b");
        assert_eq!(cache.peek(&1), Some(&"a"));
        assert_eq!(cache.put(3, "c"), PutOutcome::Evicted(1, "a"));
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3);

        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.keys(), vec![1, 3]);
    }

    #[test]
    fn test_lru_drain() {
        let mut cache = LruCache::new(3);

        cache.put(1, "a");
        cache.put(2, "b");
        let mut drained = cache.drain();
        drained.sort();

        assert_eq!(drained, vec!["a", "b"]);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = LruCache::new(2);

        cache.put(1, "a");
        cache.put(2, "b");
        assert_eq!(cache.put(1, "c"), PutOutcome::Replaced("a"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec![2, 1]);
        assert_eq!(cache.peek(&1), Some(&"c"));
    }

    #[test]
    fn test_lru_repeated_eviction_keeps_order() {
        let mut cache = LruCache::new(3);

        for i in 0..10 {
            cache.put(i, i * 10);
            assert!(cache.len() <= 3);
        }

        assert_eq!(cache.keys(), vec![7, 8, 9]);
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than 0")]
    fn test_lru_zero_capacity_panics() {
        let _cache: LruCache<u8, u8> = LruCache::new(0);
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = LruCache::new(1);

        cache.put("a", 1);
        assert_eq!(cache.put("b", 2), PutOutcome::Evicted("a", 1));
        assert_eq!(cache.put("b", 3), PutOutcome::Replaced(2));
        assert_eq!(cache.keys(), vec!["b"]);
    }
}
