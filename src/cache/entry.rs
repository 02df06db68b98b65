//! Cache Item Module
//!
//! Defines the record stored for every cached key: the value plus its
//! timestamps and an optional dispose callback.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Callback run once when an item leaves the cache by delete, eviction or expiry.
pub type DisposeFn = Box<dyn FnOnce() + Send + 'static>;

// == Time To Live ==
/// Lifetime of an item, measured from its storage timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ttl {
    /// Expires this many milliseconds after the reference timestamp
    Millis(i64),
    /// Never expires
    #[default]
    Never,
}

impl Ttl {
    /// Computes the expiry timestamp when counting from `from`.
    ///
    /// Returns `None` for [`Ttl::Never`]. Negative lifetimes land in the past
    /// and saturate at zero.
    pub fn expires_at(self, from: u64) -> Option<u64> {
        match self {
            Ttl::Millis(ms) => Some(from.saturating_add_signed(ms)),
            Ttl::Never => None,
        }
    }

    /// Rejects lifetimes that cannot be attached to a write.
    pub(crate) fn checked(self) -> Result<Self> {
        match self {
            Ttl::Millis(ms) if ms <= 0 => Err(CacheError::InvalidTtl(ms)),
            ttl => Ok(ttl),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::Millis(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
    }
}

// == Cache Item ==
/// A single cached value with its metadata.
pub struct Item<V> {
    value: V,
    stored_at: u64,
    expires_at: Option<u64>,
    dispose: Option<DisposeFn>,
}

impl<V> Item<V> {
    // == Constructor ==
    /// Creates an item stored at `stored_at` that expires at `expires_at`
    /// (`None` = never).
    pub fn new(value: V, stored_at: u64, expires_at: Option<u64>) -> Self {
        Self {
            value,
            stored_at,
            expires_at,
            dispose: None,
        }
    }

    /// Attaches a dispose callback, replacing any previous one.
    pub fn with_dispose(mut self, dispose: impl FnOnce() + Send + 'static) -> Self {
        self.dispose = Some(Box::new(dispose));
        self
    }

    pub(crate) fn from_parts(
        value: V,
        stored_at: u64,
        expires_at: Option<u64>,
        dispose: Option<DisposeFn>,
    ) -> Self {
        Self {
            value,
            stored_at,
            expires_at,
            dispose,
        }
    }

    // == Accessors ==
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Storage timestamp (Unix milliseconds)
    pub fn stored_at(&self) -> u64 {
        self.stored_at
    }

    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    pub fn has_dispose(&self) -> bool {
        self.dispose.is_some()
    }

    pub(crate) fn set_expires_at(&mut self, expires_at: Option<u64>) {
        self.expires_at = expires_at;
    }

    // == Is Expired ==
    /// Checks whether the item is expired as of `as_of`.
    ///
    /// Boundary condition: an item is expired once `as_of` reaches its expiry
    /// timestamp, so an item stored at 10000 with a 5000ms TTL is live at 14999
    /// and expired at 15000.
    pub fn is_expired_at(&self, as_of: u64) -> bool {
        match self.expires_at {
            Some(expires) => expires <= as_of,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds as of `as_of`.
    ///
    /// # Returns
    /// - `Some(0)` if the item has expired
    /// - `Some(remaining_ms)` if the item has a TTL and hasn't expired
    /// - `None` if the item never expires
    pub fn ttl_remaining_ms(&self, as_of: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(as_of))
    }

    // == Dispose ==
    /// Consumes the item, running its dispose callback if one is registered.
    pub(crate) fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }

    /// Owned copy of the value and metadata, without the callback.
    pub fn snapshot(&self) -> ItemSnapshot<V>
    where
        V: Clone,
    {
        ItemSnapshot {
            value: self.value.clone(),
            stored_at: self.stored_at,
            expires_at: self.expires_at,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Item<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("value", &self.value)
            .field("stored_at", &self.stored_at)
            .field("expires_at", &self.expires_at)
            .field("has_dispose", &self.dispose.is_some())
            .finish()
    }
}

// == Item Snapshot ==
/// Detached copy of an item, returned by the thread-safe handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSnapshot<V> {
    pub value: V,
    pub stored_at: u64,
    pub expires_at: Option<u64>,
}
