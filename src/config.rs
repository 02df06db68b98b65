//! Configuration Module
//!
//! Handles cache construction parameters, including loading them from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::Ttl;
use crate::error::{CacheError, Result};

// == Eviction Strategy ==
/// Which item is removed when a write needs room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Oldest inserted item first, regardless of reads
    Age,
    /// Least recently read or written item first
    #[default]
    Lru,
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "age" => Ok(EvictionStrategy::Age),
            "lru" => Ok(EvictionStrategy::Lru),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown eviction strategy '{}', expected 'age' or 'lru'",
                other
            ))),
        }
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionStrategy::Age => f.write_str("age"),
            EvictionStrategy::Lru => f.write_str("lru"),
        }
    }
}

// == Cache Config ==
/// Cache configuration parameters.
///
/// Fixed once a cache is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied to writes that don't carry one
    pub default_ttl: Ttl,
    /// Maximum number of items, None = unbounded
    pub max_items: Option<usize>,
    /// Policy used when a write needs room
    pub eviction: EvictionStrategy,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: never expires)
    /// - `CACHE_MAX_ITEMS` - Maximum cache items (default: unbounded)
    /// - `CACHE_EVICTION` - `age` or `lru` (default: lru)
    pub fn from_env() -> Self {
        Self {
            default_ttl: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Ttl::Millis)
                .unwrap_or_default(),
            max_items: env::var("CACHE_MAX_ITEMS")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            eviction: env::var("CACHE_EVICTION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn with_default_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.default_ttl = ttl.into();
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionStrategy) -> Self {
        self.eviction = eviction;
        self
    }

    // == Validate ==
    /// Rejects a negative default TTL and a zero capacity.
    pub fn validate(&self) -> Result<()> {
        if let Ttl::Millis(ms) = self.default_ttl {
            if ms < 0 {
                return Err(CacheError::InvalidConfig(format!(
                    "default_ttl must not be negative, got {}ms",
                    ms
                )));
            }
        }
        if self.max_items == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_items must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
