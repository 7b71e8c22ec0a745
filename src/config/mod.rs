//! # Cache Configuration
//!
//! Layered configuration for the cache cluster and its clients: built-in
//! defaults, then an optional TOML file, then `RING_CACHE__*` environment
//! variables (double underscore separates nesting, e.g.
//! `RING_CACHE__CLUSTER__REPLICATION_FACTOR=3`).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ring_cache::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load()?;
//! println!("replication factor: {}", config.cluster.replication_factor);
//! println!("product ttl: {:?}", config.client.product_ttl());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration structure mirroring `ring-cache.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RingCacheConfig {
    /// Ring layout and seed membership
    pub cluster: ClusterConfig,

    /// Client TTL defaults
    pub client: ClientConfig,

    /// Cache-path circuit breaker thresholds
    pub circuit_breaker: CircuitBreakerSettings,

    /// Log output settings
    pub logging: LoggingConfig,
}

impl RingCacheConfig {
    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.cluster.validate()?;
        self.client.validate()?;
        self.circuit_breaker.validate()?;
        Ok(())
    }
}

/// Ring layout and seed membership
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Distinct physical nodes returned by replica lookups
    pub replication_factor: usize,

    /// Ring positions per physical node
    pub virtual_nodes_per_node: usize,

    /// Nodes registered at startup, in order
    pub nodes: Vec<SeedNodeConfig>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            replication_factor: 3,
            virtual_nodes_per_node: 150,
            nodes: Vec::new(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.replication_factor == 0 {
            return Err(ConfigurationError::invalid_value(
                "cluster.replication_factor",
                self.replication_factor,
                "must be at least 1",
            ));
        }

        if self.virtual_nodes_per_node == 0 || self.virtual_nodes_per_node > 10_000 {
            return Err(ConfigurationError::invalid_value(
                "cluster.virtual_nodes_per_node",
                self.virtual_nodes_per_node,
                "must be between 1 and 10000",
            ));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.id.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "cluster.nodes.id",
                    &node.id,
                    "node id must not be empty",
                ));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "cluster.nodes.id",
                    &node.id,
                    "node ids must be unique",
                ));
            }
        }

        Ok(())
    }
}

/// A node registered when the cluster is built from configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeedNodeConfig {
    pub id: String,
    pub host: String,
    pub port: u16,
}

/// TTL defaults used by the cache client
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub default_ttl_seconds: u64,
    pub product_ttl_seconds: u64,
    pub cart_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 3600,
            product_ttl_seconds: 3600,
            cart_ttl_seconds: 1800,
            session_ttl_seconds: 3600,
        }
    }
}

impl ClientConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn product_ttl(&self) -> Duration {
        Duration::from_secs(self.product_ttl_seconds)
    }

    pub fn cart_ttl(&self) -> Duration {
        Duration::from_secs(self.cart_ttl_seconds)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    /// TTL applied to `collection` when a caller does not pass one
    pub fn ttl_for(&self, collection: &str) -> Duration {
        match collection {
            "product" => self.product_ttl(),
            "cart" => self.cart_ttl(),
            "session" => self.session_ttl(),
            _ => self.default_ttl(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let ttls = [
            ("client.default_ttl_seconds", self.default_ttl_seconds),
            ("client.product_ttl_seconds", self.product_ttl_seconds),
            ("client.cart_ttl_seconds", self.cart_ttl_seconds),
            ("client.session_ttl_seconds", self.session_ttl_seconds),
        ];
        for (field, value) in ttls {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "ttl must be greater than 0",
                ));
            }
        }
        Ok(())
    }
}

/// File representation of [`CircuitBreakerConfig`]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        let preset = CircuitBreakerConfig::for_cache_path();
        Self {
            failure_threshold: preset.failure_threshold,
            timeout_seconds: preset.timeout.as_secs(),
        }
    }
}

impl CircuitBreakerSettings {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.to_breaker_config().validate().map_err(|reason| {
            ConfigurationError::invalid_value(
                "circuit_breaker",
                format!(
                    "failure_threshold={}, timeout_seconds={}",
                    self.failure_threshold, self.timeout_seconds
                ),
                reason,
            )
        })
    }
}

/// Log output settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Filter directive overriding the environment default (e.g. `"info"`)
    pub level: Option<String>,
}
