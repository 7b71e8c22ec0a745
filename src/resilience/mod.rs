//! # Resilience Module
//!
//! Circuit breaking for the client's cache path. Callers consult
//! [`CircuitBreaker::is_open`] before touching a dependency and report the
//! outcome with `record_success` / `record_failure`.
//!
//! ## Usage
//!
//! ```rust
//! use ring_cache::clock::system_clock;
//! use ring_cache::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 5,
//!     timeout: Duration::from_secs(60),
//! };
//! let breaker = CircuitBreaker::new("cache_path", config, system_clock());
//!
//! if !breaker.is_open() {
//!     // touch the cache, then report the outcome
//!     breaker.record_success();
//! }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;
