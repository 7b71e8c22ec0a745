//! Backing store doubles

#![allow(dead_code)]

use async_trait::async_trait;
use ring_cache::client::{BackingStore, InMemoryBackingStore};
use ring_cache::error::{StoreError, StoreResult};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory store that counts calls and can be switched into failure mode
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryBackingStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, collection: &str, id: &str, value: Value) {
        self.inner.insert(collection, id, value);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackingStore for CountingStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "read of {collection}/{id} refused"
            )));
        }
        self.inner.get(collection, id).await
    }

    async fn save(&self, collection: &str, id: &str, value: Value) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "write of {collection}/{id} rejected"
            )));
        }
        self.inner.save(collection, id, value).await
    }
}
