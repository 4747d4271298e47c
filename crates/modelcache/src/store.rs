//! CacheStore: bounded LRU map of validity-checked payloads

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::checker::{Signature, ValidityChecker};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::lru::{LruCache, PutOutcome};
use crate::payload::Payload;
use crate::reclaim::{NoopReclaimer, Reclaimer};
use crate::stats::CacheStats;

/// Bounded memoization store with LRU eviction and validity-gated lookups
///
/// One lock guards the entry map and the recency order together, and is held
/// for the whole of each operation. Validity checks read the live resource
/// while that lock is held, so a resource's `shape` must never call back into
/// the store.
pub struct CacheStore<K, P> {
    /// Entries and recency order
    entries: RwLock<LruCache<K, ValidityChecker<P>>>,

    /// Cache statistics
    stats: CacheStats,

    /// Signalled after evictions
    reclaimer: Box<dyn Reclaimer>,

    reclaim_on_evict: bool,
}

impl<K, P> CacheStore<K, P>
where
    K: Hash + Eq + Clone + fmt::Debug,
    P: Payload,
{
    /// Create a new store with the given capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, at least 1
    ///
    /// # Returns
    /// * `Result<CacheStore>` - Empty store, or `InvalidCapacity`
    pub fn new(capacity: usize) -> Result<Self> {
        Self::from_config(&CacheConfig::with_capacity(capacity))
    }

    /// Create a new store from a config
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        info!(capacity = config.capacity, "Model cache initialized");

        Ok(Self {
            entries: RwLock::new(LruCache::new(config.capacity)),
            stats: CacheStats::new(),
            reclaimer: Box::new(NoopReclaimer),
            reclaim_on_evict: config.reclaim_on_evict,
        })
    }

    /// Install the hook signalled after each eviction
    pub fn with_reclaimer<R>(mut self, reclaimer: R) -> Self
    where
        R: Reclaimer + 'static,
    {
        self.reclaimer = Box::new(reclaimer);
        self
    }

    /// Check whether a key holds a payload that is still structurally valid
    ///
    /// Does not touch recency. An invalid entry is reported as a miss but
    /// stays in place until it is overwritten or evicted.
    pub fn is_cached(&self, key: &K) -> bool {
        let entries = self.entries.read();
        match entries.peek(key) {
            Some(checker) if checker.is_valid() => true,
            Some(_) => {
                debug!(?key, "Model cache: entry is stale");
                self.stats.record_stale();
                false
            }
            None => {
                self.stats.record_miss();
                false
            }
        }
    }

    /// Return a present payload and mark it most recently used
    ///
    /// Callers pair this with a preceding `is_cached`; a missing key is a
    /// protocol error.
    ///
    /// # Returns
    /// * `Result<Arc<P>>` - The cached payload, or `KeyNotFound`
    pub fn retrieve(&self, key: &K) -> Result<Arc<P>> {
        let payload = {
            let mut entries = self.entries.write();
            let checker = entries.get(key).ok_or(Error::KeyNotFound)?;
            Arc::clone(checker.payload())
        };

        self.stats.record_hit();
        info!(?key, "Model cache: returning cached result");
        Ok(payload)
    }

    /// Check-then-retrieve under a single lock
    ///
    /// # Returns
    /// * `Option<Arc<P>>` - The payload if present and valid
    pub fn lookup(&self, key: &K) -> Option<Arc<P>> {
        let payload = {
            let mut entries = self.entries.write();
            match entries.peek(key) {
                Some(checker) if checker.is_valid() => {}
                Some(_) => {
                    debug!(?key, "Model cache: entry is stale");
                    self.stats.record_stale();
                    return None;
                }
                None => {
                    self.stats.record_miss();
                    return None;
                }
            }
            entries.get(key).map(|checker| Arc::clone(checker.payload()))
        };

        if payload.is_some() {
            self.stats.record_hit();
            info!(?key, "Model cache: returning cached result");
        }
        payload
    }

    /// Store a payload under a key, overwriting any previous entry
    ///
    /// When the store is full and the key is new, exactly one least recently
    /// used entry is evicted regardless of its validity, and the reclamation
    /// hook is signalled once the lock is released.
    ///
    /// # Returns
    /// * `Arc<P>` - The stored payload
    pub fn insert(&self, key: K, payload: impl Into<Arc<P>>) -> Arc<P> {
        let payload = payload.into();
        let checker = ValidityChecker::new(Arc::clone(&payload));
        debug!(?key, signature = %checker.signature(), "Model cache: registering result");

        let outcome = self.entries.write().put(key, checker);
        self.stats.record_insert();

        match outcome {
            PutOutcome::Inserted => {}
            PutOutcome::Replaced(old) => {
                self.stats.record_overwrite();
                drop(old);
            }
            PutOutcome::Evicted(evicted_key, old) => {
                self.stats.record_eviction();
                debug!(key = ?evicted_key, "Model cache: evicted least recently used entry");
                drop(old);
                if self.reclaim_on_evict {
                    self.reclaimer.reclaim();
                }
            }
        }

        payload
    }

    /// Check presence regardless of validity
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.read().contains(key)
    }

    /// Signature captured when the key's payload was inserted
    pub fn signature(&self, key: &K) -> Option<Signature> {
        self.entries.read().peek(key).map(|checker| checker.signature())
    }

    /// Remove a key, returning its payload
    pub fn remove(&self, key: &K) -> Option<Arc<P>> {
        let checker = self.entries.write().remove(key)?;
        Some(Arc::clone(checker.payload()))
    }

    /// Drop every entry and signal the reclamation hook
    pub fn clear(&self) {
        let drained = self.entries.write().drain();
        let had_entries = !drained.is_empty();
        drop(drained);

        self.stats.reset();
        if had_entries && self.reclaim_on_evict {
            self.reclaimer.reclaim();
        }
    }

    /// Keys ordered least recently used first
    pub fn keys(&self) -> Vec<K> {
        self.entries.read().keys()
    }

    /// Get current number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Get store capacity
    pub fn capacity(&self) -> usize {
        self.entries.read().capacity()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, P> fmt::Debug for CacheStore<K, P>
where
    K: Hash + Eq + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("capacity", &self.entries.read().capacity())
            .field("reclaim_on_evict", &self.reclaim_on_evict)
            .finish_non_exhaustive()
    }
}
