//! Backing store boundary.
//!
//! The authoritative store the cache fronts. Its latency and failure modes
//! are its own; the client only propagates its errors.

use crate::error::StoreResult;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt::Debug;

/// Authoritative key/value store, partitioned into collections
/// (e.g. `product`, `cart`)
#[async_trait]
pub trait BackingStore: Send + Sync + Debug {
    /// Fetch a record; `Ok(None)` when it does not exist
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Durably write a record, replacing any previous version
    async fn save(&self, collection: &str, id: &str, value: Value) -> StoreResult<()>;
}

/// Process-local store keyed by `(collection, id)`
#[derive(Debug, Default)]
pub struct InMemoryBackingStore {
    records: DashMap<(String, String), Value>,
}

impl InMemoryBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without going through the async interface
    pub fn insert(&self, collection: &str, id: &str, value: Value) {
        self.records
            .insert((collection.to_string(), id.to_string()), value);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl BackingStore for InMemoryBackingStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .records
            .get(&(collection.to_string(), id.to_string()))
            .map(|record| record.value().clone()))
    }

    async fn save(&self, collection: &str, id: &str, value: Value) -> StoreResult<()> {
        self.insert(collection, id, value);
        Ok(())
    }
}
