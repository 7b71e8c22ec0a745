//! Hit/miss/fallback accounting for the cache client.

use chrono::{DateTime, Utc};
use crossbeam::utils::CachePadded;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of client counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheClientMetrics {
    /// Reads answered from the cache
    pub hits: u64,

    /// Reads the cache could not answer
    pub misses: u64,

    /// Reads served from the backing store
    pub fallbacks: u64,

    /// Cache operations that failed and were recovered locally
    pub cache_errors: u64,

    /// `hits / (hits + misses)`, 0.0 before any read
    pub hit_rate: f64,

    pub captured_at: DateTime<Utc>,
}

/// Padded atomic counters; exact cross-counter consistency is not required
#[derive(Debug, Default)]
pub(crate) struct ClientCounters {
    hits: CachePadded<AtomicU64>,
    misses: CachePadded<AtomicU64>,
    fallbacks: CachePadded<AtomicU64>,
    cache_errors: CachePadded<AtomicU64>,
}

impl ClientCounters {
    #[inline]
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
        self.cache_errors.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheClientMetrics {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let reads = hits + misses;

        CacheClientMetrics {
            hits,
            misses,
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            hit_rate: if reads > 0 {
                hits as f64 / reads as f64
            } else {
                0.0
            },
            captured_at: Utc::now(),
        }
    }
}
