//! Store configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default maximum number of cached entries
pub const DEFAULT_CAPACITY: usize = 100;

/// Configuration for a [`CacheStore`](crate::CacheStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of entries held at once
    pub capacity: usize,

    /// Whether to fire the reclamation hook after an eviction
    pub reclaim_on_evict: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            reclaim_on_evict: true,
        }
    }
}

impl CacheConfig {
    /// Config with the given capacity and default everything else
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config document
    ///
    /// Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CacheConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the store cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 1 {
            return Err(Error::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}
