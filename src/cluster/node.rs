//! # Cache Node
//!
//! A single cache server: identity, address, health flag and a local
//! key/value store with per-entry expiry. Expired entries are only removed
//! when a read observes them; there is no background sweep.

use crate::clock::SharedClock;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// A stored value and its absolute expiry in clock milliseconds
#[derive(Debug, Clone)]
struct CachedEntry {
    value: Value,
    expires_at_millis: u64,
}

impl CachedEntry {
    #[inline]
    fn is_expired(&self, now_millis: u64) -> bool {
        now_millis > self.expires_at_millis
    }
}

/// Single cache server instance
pub struct CacheNode {
    id: String,
    host: String,
    port: u16,
    healthy: AtomicBool,
    storage: DashMap<String, CachedEntry>,
    clock: SharedClock,
}

impl CacheNode {
    /// Create a healthy node with an empty store
    pub fn new(
        id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        clock: SharedClock,
    ) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
            healthy: AtomicBool::new(true),
            storage: DashMap::new(),
            clock,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    pub fn mark_healthy(&self) {
        if !self.healthy.swap(true, Ordering::AcqRel) {
            info!(node_id = %self.id, address = %self.address(), "Cache node marked healthy");
        }
    }

    pub fn mark_unhealthy(&self) {
        if self.healthy.swap(false, Ordering::AcqRel) {
            warn!(node_id = %self.id, address = %self.address(), "Cache node marked unhealthy");
        }
    }

    /// Store `value` under `key` until `ttl` has elapsed, replacing any
    /// existing entry.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let expires_at_millis = self
            .clock
            .now_millis()
            .saturating_add(ttl.as_millis() as u64);
        self.storage.insert(
            key.into(),
            CachedEntry {
                value,
                expires_at_millis,
            },
        );
    }

    /// Read a live value; an expired entry is dropped and reported as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_millis();
        {
            let entry = self.storage.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }
        // Re-check under the shard write lock so a concurrent fresh `set`
        // is not removed.
        self.storage.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    pub fn delete(&self, key: &str) {
        self.storage.remove(key);
    }

    /// Whether a live entry exists; shares the lazy expiry of [`get`](Self::get).
    pub fn exists(&self, key: &str) -> bool {
        let now = self.clock.now_millis();
        let expired = match self.storage.get(key) {
            None => return false,
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            self.storage.remove_if(key, |_, entry| entry.is_expired(now));
        }
        !expired
    }

    /// Stored entries, including expired ones that have not been read yet
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop every stored entry
    pub fn clear(&self) {
        self.storage.clear();
    }
}

impl fmt::Debug for CacheNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheNode")
            .field("id", &self.id)
            .field("address", &self.address())
            .field("healthy", &self.is_healthy())
            .field("entries", &self.storage.len())
            .finish()
    }
}
