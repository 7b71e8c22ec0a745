//! Error types for the cache routing layer.

use crate::config::ConfigurationError;
use thiserror::Error;

/// Errors surfaced by the cache routing layer and its clients
#[derive(Debug, Error)]
pub enum CacheError {
    /// Key or id rejected before any ring or node interaction
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A node with the same id is already a cluster member
    #[error("Node already registered: {0}")]
    DuplicateNode(String),

    /// No cluster member has the requested id
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Failed to serialize or deserialize a cached value
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// The authoritative store failed; never recovered locally
    #[error("Backing store error: {0}")]
    BackingStore(#[from] StoreError),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Serialization(error.to_string())
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors reported by a [`BackingStore`](crate::client::BackingStore) implementation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store rejected or failed the operation
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Stored payload could not be encoded or decoded
    #[error("Store serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error.to_string())
    }
}

/// Result type for backing store operations
pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn validate_key(kind: &str, key: &str) -> CacheResult<()> {
    if key.trim().is_empty() {
        return Err(CacheError::InvalidKey(format!("{kind} must not be empty")));
    }
    Ok(())
}
