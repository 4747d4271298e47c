//! # modelcache
//!
//! Bounded memoization cache for heavyweight, externally managed model
//! instances, keyed by the arguments used to build them.
//!
//! ## Architecture
//! - **Store**: AHash index plus intrusive LRU list under one lock (O(1))
//! - **Validity**: each entry fingerprints its resource when inserted and
//!   re-checks the live resource on every lookup
//! - **Wrapper**: `memoize` / `ModelCache` run the build routine only on a miss
//!
//! A cached resource can be partially released by code outside the cache.
//! The fingerprint is the number of named parameters (or mapping keys), so
//! such a release is caught; drift that keeps the count is not.

#![warn(missing_docs)]

mod checker;
mod config;
mod error;
mod key;
mod lru;
mod memoize;
mod payload;
mod reclaim;
mod resource;
mod stats;
mod store;

pub use checker::{Signature, ValidityChecker};
pub use config::{CacheConfig, DEFAULT_CAPACITY};
pub use error::{Error, Result};
pub use key::{CacheKey, KeyBuilder};
pub use memoize::{memoize, try_memoize, ModelCache};
pub use payload::Payload;
pub use reclaim::{NoopReclaimer, Reclaimer};
pub use resource::{Opaque, Resource, ResourceShape, StateDict};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
