//! Memoizing wrappers around expensive build routines
//!
//! The build routine always runs outside the store lock. Two callers missing
//! on the same key at once may both build; the later insert wins.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::key::{CacheKey, KeyBuilder};
use crate::payload::Payload;
use crate::store::CacheStore;

/// Return the cached payload for `key`, or build, insert and return it
pub fn memoize<K, P, F>(store: &CacheStore<K, P>, key: K, build: F) -> Arc<P>
where
    K: Hash + Eq + Clone + fmt::Debug,
    P: Payload,
    F: FnOnce() -> P,
{
    match store.lookup(&key) {
        Some(payload) => payload,
        None => store.insert(key, build()),
    }
}

/// Like [`memoize`], for build routines that can fail
///
/// A failed build inserts nothing.
pub fn try_memoize<K, P, F, E>(
    store: &CacheStore<K, P>,
    key: K,
    build: F,
) -> std::result::Result<Arc<P>, E>
where
    K: Hash + Eq + Clone + fmt::Debug,
    P: Payload,
    F: FnOnce() -> std::result::Result<P, E>,
{
    if let Some(payload) = store.lookup(&key) {
        return Ok(payload);
    }
    let payload = build()?;
    Ok(store.insert(key, payload))
}

/// Shared handle to a store keyed by call arguments
pub struct ModelCache<P> {
    store: Arc<CacheStore<CacheKey, P>>,
}

impl<P: Payload> ModelCache<P> {
    /// Create a handle over a fresh store
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::from_store(Arc::new(CacheStore::new(capacity)?)))
    }

    /// Create a handle over an existing store
    pub fn from_store(store: Arc<CacheStore<CacheKey, P>>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<CacheStore<CacheKey, P>> {
        &self.store
    }

    /// Cached payload for the given arguments, or build it
    ///
    /// # Arguments
    /// * `key` - Arguments of the call being memoized
    /// * `build` - Construction routine run on a miss
    ///
    /// # Returns
    /// * `Result<Arc<P>>` - Fails only if the arguments cannot be encoded
    pub fn get_or_build<F>(&self, key: KeyBuilder, build: F) -> Result<Arc<P>>
    where
        F: FnOnce() -> P,
    {
        let key = key.build()?;
        Ok(memoize(&*self.store, key, build))
    }

    /// Cached payload for the given arguments, or run a fallible build
    pub fn try_get_or_build<F, E>(
        &self,
        key: KeyBuilder,
        build: F,
    ) -> std::result::Result<Arc<P>, E>
    where
        F: FnOnce() -> std::result::Result<P, E>,
        E: From<Error>,
    {
        let key = key.build()?;
        try_memoize(&*self.store, key, build)
    }

    /// Wrap a build routine so every call goes through the cache
    ///
    /// The whole argument value forms a single positional key part, so a tuple
    /// of arguments is discriminated by every element's type.
    pub fn memoized<A, F>(&self, build: F) -> impl Fn(A) -> Result<Arc<P>>
    where
        A: Serialize,
        F: Fn(A) -> P,
    {
        let cache = self.clone();
        move |args: A| {
            let key = CacheKey::of(&args)?;
            Ok(memoize(&*cache.store, key, || build(args)))
        }
    }
}

impl<P> Clone for ModelCache<P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
