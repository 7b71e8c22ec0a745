#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Ring Cache
//!
//! Consistent-hash routing layer for a distributed in-memory cache.
//!
//! ## Overview
//!
//! Keys are placed on a hash ring of virtual nodes, so adding or removing a
//! cache node only moves the keys adjacent to its positions. Routing skips
//! unhealthy nodes, replicas are picked by walking the ring, and entries
//! expire lazily on read. A client layer puts cache-aside and write-through
//! strategies in front of an authoritative backing store, guarded by a
//! circuit breaker so a failing cache degrades to store reads.
//!
//! ## Module Organization
//!
//! - [`cluster`] - Cache nodes, the hash ring and cluster membership
//! - [`client`] - Cache access strategies and the backing store boundary
//! - [`resilience`] - Circuit breaker for the cache path
//! - [`config`] - Layered configuration loading
//! - [`clock`] - Injectable time source for TTL and breaker timing
//! - [`error`] - Structured error handling
//! - [`logging`] - `tracing` subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ring_cache::client::{CacheClient, InMemoryBackingStore};
//! use ring_cache::clock::system_clock;
//! use ring_cache::config::ConfigLoader;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load()?;
//! ring_cache::logging::init_with_config(&config.logging);
//!
//! let client = CacheClient::from_config(
//!     &config,
//!     Arc::new(InMemoryBackingStore::new()),
//!     system_clock(),
//! )?;
//! let ttl = client.settings().product_ttl();
//! let product: Option<serde_json::Value> = client.get("product", "PROD-12345", ttl).await?;
//! # let _ = product;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and doc tests
//! cargo bench --features benchmarks
//! ```

pub mod client;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod error;
pub mod logging;
pub mod resilience;

pub use client::{BackingStore, CacheClient, CacheClientMetrics, InMemoryBackingStore};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use cluster::{CacheNode, ClusterStatus, DistributedCacheSystem, HashRing};
pub use config::{ConfigLoader, RingCacheConfig};
pub use error::{CacheError, CacheResult, StoreError, StoreResult};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
