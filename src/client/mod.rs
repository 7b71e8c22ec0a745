//! # Cache Client
//!
//! Access strategies over the cache cluster: cache-aside reads, write-through
//! writes, concurrent batch reads and TTL-scoped session storage, with the
//! [`BackingStore`] as the authoritative copy.
//!
//! ## Usage
//!
//! ```rust
//! use ring_cache::client::{CacheClient, InMemoryBackingStore};
//! use ring_cache::clock::system_clock;
//! use ring_cache::cluster::DistributedCacheSystem;
//! use ring_cache::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let clock = system_clock();
//! let cluster = Arc::new(DistributedCacheSystem::new(2, 150, clock.clone()));
//! cluster.add_node(cluster.create_node("cache-node-1", "10.0.1.10", 6379)).unwrap();
//!
//! let breaker = Arc::new(CircuitBreaker::new(
//!     "cache_path",
//!     CircuitBreakerConfig::for_cache_path(),
//!     clock,
//! ));
//! let client = CacheClient::new(cluster, Arc::new(InMemoryBackingStore::new()), breaker);
//!
//! client
//!     .put("product", "PROD-1", &json!({"price": 99.99}), Duration::from_secs(3600))
//!     .await
//!     .unwrap();
//! let product: Option<serde_json::Value> = client
//!     .get("product", "PROD-1", Duration::from_secs(3600))
//!     .await
//!     .unwrap();
//! assert!(product.is_some());
//! # });
//! ```

pub mod cache_client;
pub mod metrics;
pub mod store;

pub use cache_client::{cache_key, CacheClient};
pub use metrics::CacheClientMetrics;
pub use store::{BackingStore, InMemoryBackingStore};

/// Collection name under which sessions are cached
pub const SESSION_NAMESPACE: &str = "session";
