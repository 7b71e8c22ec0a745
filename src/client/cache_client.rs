//! # Cache Client
//!
//! Cache-aside reads and write-through writes over a
//! [`DistributedCacheSystem`], with the backing store as the source of truth.
//!
//! Cache-side problems (no routable node, an unhealthy node, an entry that
//! does not decode, an open circuit) are always recovered by going to the
//! backing store. Only backing-store errors and caller input errors reach the
//! caller.

use crate::client::metrics::{CacheClientMetrics, ClientCounters};
use crate::client::store::BackingStore;
use crate::client::SESSION_NAMESPACE;
use crate::clock::SharedClock;
use crate::cluster::{CacheNode, DistributedCacheSystem};
use crate::config::{ClientConfig, RingCacheConfig};
use crate::error::{validate_key, CacheError, CacheResult};
use crate::resilience::CircuitBreaker;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of consulting the cache for a read
enum CacheLookup<T> {
    /// Live, decodable entry
    Hit(T),
    /// Nothing usable cached; carries the healthy node to populate, if any
    Miss(Option<Arc<CacheNode>>),
    /// Circuit open, cache not consulted
    Bypassed,
}

/// Build the namespaced cache key `"<collection>:<id>"`
pub fn cache_key(collection: &str, id: &str) -> CacheResult<String> {
    validate_key("collection", collection)?;
    validate_key("id", id)?;
    Ok(format!("{collection}:{id}"))
}

/// Strategy layer between callers, the cache cluster and the backing store
#[derive(Debug)]
pub struct CacheClient {
    cluster: Arc<DistributedCacheSystem>,
    store: Arc<dyn BackingStore>,
    circuit_breaker: Arc<CircuitBreaker>,
    settings: ClientConfig,
    counters: ClientCounters,
}

impl CacheClient {
    pub fn new(
        cluster: Arc<DistributedCacheSystem>,
        store: Arc<dyn BackingStore>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            cluster,
            store,
            circuit_breaker,
            settings: ClientConfig::default(),
            counters: ClientCounters::default(),
        }
    }

    /// Build the cluster, its seed nodes and the cache-path breaker from
    /// loaded configuration.
    pub fn from_config(
        config: &RingCacheConfig,
        store: Arc<dyn BackingStore>,
        clock: SharedClock,
    ) -> CacheResult<Self> {
        config.validate()?;
        let cluster = Arc::new(DistributedCacheSystem::from_config(
            &config.cluster,
            clock.clone(),
        )?);
        let circuit_breaker = Arc::new(CircuitBreaker::new(
            "cache_path",
            config.circuit_breaker.to_breaker_config(),
            clock,
        ));

        Ok(Self {
            settings: config.client.clone(),
            ..Self::new(cluster, store, circuit_breaker)
        })
    }

    /// Cache-aside read.
    ///
    /// Returns the cached value on a hit. Otherwise reads the backing store
    /// and, when a healthy node owns the key, caches the result for `ttl`
    /// (the configured TTL for `collection` when `None`). Records that do
    /// not exist in the store are not cached.
    pub async fn get<T>(
        &self,
        collection: &str,
        id: &str,
        ttl: impl Into<Option<Duration>>,
    ) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let key = cache_key(collection, id)?;
        let ttl = self.resolve_ttl(collection, ttl.into());

        let populate_target = match self.lookup::<T>(&key) {
            Ok(CacheLookup::Hit(value)) => {
                self.counters.record_hit();
                debug!(key = %key, "Cache hit");
                return Ok(Some(value));
            }
            Ok(CacheLookup::Miss(node)) => {
                self.counters.record_miss();
                debug!(key = %key, node_available = node.is_some(), "Cache miss");
                node
            }
            Ok(CacheLookup::Bypassed) => {
                self.counters.record_miss();
                debug!(key = %key, "Cache circuit open, reading backing store");
                None
            }
            Err(error) => {
                self.counters.record_cache_error();
                warn!(
                    key = %key,
                    error = %error,
                    "Cache read failed, falling back to backing store"
                );
                None
            }
        };

        self.counters.record_fallback();
        let Some(value) = self.store.get(collection, id).await? else {
            return Ok(None);
        };
        let decoded = serde_json::from_value::<T>(value.clone())?;

        if let Some(node) = populate_target.filter(|node| node.is_healthy()) {
            node.set(key.as_str(), value, ttl);
            debug!(
                key = %key,
                node_id = %node.id(),
                ttl_secs = ttl.as_secs(),
                "Cache populated"
            );
        }

        Ok(Some(decoded))
    }

    /// Cache-aside read for each id independently. Ids without a record are
    /// omitted; the first backing-store error fails the batch.
    pub async fn get_many<T, I>(
        &self,
        collection: &str,
        ids: I,
        ttl: impl Into<Option<Duration>>,
    ) -> CacheResult<HashMap<String, T>>
    where
        T: DeserializeOwned,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let ttl = self.resolve_ttl(collection, ttl.into());
        let ids: Vec<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let reads = ids.iter().map(|id| self.get::<T>(collection, id, ttl));
        let values = try_join_all(reads).await?;

        Ok(ids
            .into_iter()
            .zip(values)
            .filter_map(|(id, value)| value.map(|v| (id, v)))
            .collect())
    }

    /// Write-through write: the backing store first, then the cache.
    ///
    /// A failed store write returns the error with the cache untouched. With
    /// the circuit open the cached copy is dropped instead of updated, so a
    /// later read cannot return the previous value.
    pub async fn put<T>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
        ttl: impl Into<Option<Duration>>,
    ) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        let key = cache_key(collection, id)?;
        let ttl = self.resolve_ttl(collection, ttl.into());
        let value = serde_json::to_value(value)?;

        self.store.save(collection, id, value.clone()).await?;

        if self.circuit_breaker.is_open() {
            self.drop_stale(&key);
            return Ok(());
        }

        match self.cluster.get_node_for_key(&key) {
            Ok(Some(node)) if node.is_healthy() => {
                node.set(key.as_str(), value, ttl);
                self.circuit_breaker.record_success();
                debug!(key = %key, node_id = %node.id(), "Write-through cached");
            }
            Ok(_) => {
                debug!(key = %key, "No healthy cache node, write-through skipped cache");
            }
            Err(error) => {
                self.counters.record_cache_error();
                self.circuit_breaker.record_failure();
                warn!(key = %key, error = %error, "Write-through cache update failed");
            }
        }

        Ok(())
    }

    /// Drop the cached copy of a record without touching the backing store.
    pub fn invalidate(&self, collection: &str, id: &str) -> CacheResult<()> {
        let key = cache_key(collection, id)?;
        if let Some(node) = self.cluster.get_node_for_key(&key)? {
            node.delete(&key);
            debug!(key = %key, node_id = %node.id(), "Cache entry invalidated");
        }
        Ok(())
    }

    /// Store ephemeral session data in the cache only, for `ttl` or the
    /// configured session TTL.
    ///
    /// Returns `false` when no healthy node could take the write. With the
    /// circuit open any previous session under the id is dropped.
    pub fn store_session<T>(
        &self,
        session_id: &str,
        session: &T,
        ttl: impl Into<Option<Duration>>,
    ) -> CacheResult<bool>
    where
        T: Serialize + ?Sized,
    {
        let key = cache_key(SESSION_NAMESPACE, session_id)?;
        let ttl = self.resolve_ttl(SESSION_NAMESPACE, ttl.into());
        let value = serde_json::to_value(session)?;

        if self.circuit_breaker.is_open() {
            self.drop_stale(&key);
            return Ok(false);
        }

        match self.cluster.get_node_for_key(&key)? {
            Some(node) if node.is_healthy() => {
                node.set(key.as_str(), value, ttl);
                self.circuit_breaker.record_success();
                Ok(true)
            }
            _ => {
                debug!(key = %key, "No healthy cache node, session not stored");
                Ok(false)
            }
        }
    }

    /// Read session data; absence (expired, never stored, node lost) is
    /// `Ok(None)`.
    pub fn get_session<T>(&self, session_id: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let key = cache_key(SESSION_NAMESPACE, session_id)?;

        match self.lookup::<T>(&key) {
            Ok(CacheLookup::Hit(session)) => {
                self.counters.record_hit();
                Ok(Some(session))
            }
            Ok(CacheLookup::Miss(_)) | Ok(CacheLookup::Bypassed) => {
                self.counters.record_miss();
                Ok(None)
            }
            Err(error) => {
                self.counters.record_cache_error();
                warn!(key = %key, error = %error, "Session read failed");
                Ok(None)
            }
        }
    }

    pub fn remove_session(&self, session_id: &str) -> CacheResult<()> {
        self.invalidate(SESSION_NAMESPACE, session_id)
    }

    pub fn metrics(&self) -> CacheClientMetrics {
        self.counters.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.counters.reset();
    }

    pub fn cluster(&self) -> &Arc<DistributedCacheSystem> {
        &self.cluster
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// TTL settings the client was configured with
    pub fn settings(&self) -> &ClientConfig {
        &self.settings
    }

    fn resolve_ttl(&self, collection: &str, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or_else(|| self.settings.ttl_for(collection))
    }

    /// Remove the cached copy of `key` from its ring owner and from the
    /// healthy node currently serving it.
    fn drop_stale(&self, key: &str) {
        let owner = self.cluster.owner_of(key).ok().flatten();
        let primary = self.cluster.get_node_for_key(key).ok().flatten();
        for node in owner.iter().chain(primary.iter()) {
            node.delete(key);
        }
        debug!(key = %key, "Cache circuit open, dropped cached copy");
    }

    /// Consult the cache for `key` under circuit breaker protection.
    fn lookup<T>(&self, key: &str) -> CacheResult<CacheLookup<T>>
    where
        T: DeserializeOwned,
    {
        if self.circuit_breaker.is_open() {
            return Ok(CacheLookup::Bypassed);
        }

        let node = match self.cluster.get_node_for_key(key) {
            Ok(Some(node)) if node.is_healthy() => node,
            Ok(_) => return Ok(CacheLookup::Miss(None)),
            Err(error) => {
                self.circuit_breaker.record_failure();
                return Err(error);
            }
        };

        let Some(raw) = node.get(key) else {
            self.circuit_breaker.record_success();
            return Ok(CacheLookup::Miss(Some(node)));
        };

        match decode::<T>(raw) {
            Ok(value) => {
                self.circuit_breaker.record_success();
                Ok(CacheLookup::Hit(value))
            }
            Err(error) => {
                // Undecodable entries would fail every subsequent read
                node.delete(key);
                self.circuit_breaker.record_failure();
                Err(error)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(raw: Value) -> CacheResult<T> {
    serde_json::from_value(raw).map_err(|e| CacheError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryBackingStore;
    use crate::clock::{ManualClock, SharedClock};
    use crate::config::SeedNodeConfig;
    use crate::resilience::CircuitBreakerConfig;
    use serde::Deserialize;
    use serde_json::json;

    const MINUTE: Duration = Duration::from_secs(60);
    const HOUR: Duration = Duration::from_secs(3600);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Product {
        id: String,
        name: String,
        price: f64,
    }

    fn client_with(
        nodes: &[&str],
    ) -> (CacheClient, Arc<InMemoryBackingStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let shared: SharedClock = clock.clone();
        let cluster = Arc::new(DistributedCacheSystem::new(2, 100, shared.clone()));
        for id in nodes {
            cluster
                .add_node(cluster.create_node(id, "127.0.0.1", 6379))
                .unwrap();
        }
        let store = Arc::new(InMemoryBackingStore::new());
        let breaker = Arc::new(CircuitBreaker::new(
            "cache_path",
            CircuitBreakerConfig::for_cache_path(),
            shared,
        ));
        let client = CacheClient::new(cluster, store.clone(), breaker);
        (client, store, clock)
    }

    fn laptop() -> Product {
        Product {
            id: "PROD-1".to_string(),
            name: "Laptop".to_string(),
            price: 999.99,
        }
    }

    fn seed_node(id: &str, host: &str) -> SeedNodeConfig {
        SeedNodeConfig {
            id: id.to_string(),
            host: host.to_string(),
            port: 6379,
        }
    }

    #[test]
    fn test_cache_key_format_and_validation() {
        assert_eq!(cache_key("product", "PROD-1").unwrap(), "product:PROD-1");
        assert!(matches!(
            cache_key("product", ""),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(
            cache_key("", "PROD-1"),
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_cold_then_warm_read() {
        let (client, store, _clock) = client_with(&["A", "B", "C"]);
        store.insert("product", "PROD-1", serde_json::to_value(laptop()).unwrap());

        let cold: Option<Product> = client.get("product", "PROD-1", HOUR).await.unwrap();
        assert_eq!(cold, Some(laptop()));
        let metrics = client.metrics();
        assert_eq!((metrics.hits, metrics.misses, metrics.fallbacks), (0, 1, 1));

        let warm: Option<Product> = client.get("product", "PROD-1", HOUR).await.unwrap();
        assert_eq!(warm, Some(laptop()));
        let metrics = client.metrics();
        assert_eq!((metrics.hits, metrics.misses, metrics.fallbacks), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_cached() {
        let (client, _store, _clock) = client_with(&["A"]);
        let value: Option<Product> = client.get("product", "NOPE", MINUTE).await.unwrap();
        assert!(value.is_none());
        assert!(client.cluster().node("A").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_entry_falls_back_and_is_evicted() {
        let (client, store, _clock) = client_with(&["A"]);
        store.insert("product", "PROD-1", serde_json::to_value(laptop()).unwrap());
        let node = client.cluster().node("A").unwrap();
        node.set("product:PROD-1", json!("not a product"), MINUTE);

        let value: Option<Product> = client.get("product", "PROD-1", MINUTE).await.unwrap();
        assert_eq!(value, Some(laptop()));

        let metrics = client.metrics();
        assert_eq!(metrics.cache_errors, 1);
        assert_eq!(metrics.fallbacks, 1);
        assert_eq!(metrics.misses, 0);
        assert_eq!(client.circuit_breaker().failure_count(), 1);
        // Evicted, and not repopulated on the error path
        assert!(!node.exists("product:PROD-1"));
    }

    #[tokio::test]
    async fn test_empty_cluster_reads_through() {
        let (client, store, _clock) = client_with(&[]);
        store.insert("product", "PROD-1", serde_json::to_value(laptop()).unwrap());

        let value: Option<Product> = client.get("product", "PROD-1", MINUTE).await.unwrap();
        assert_eq!(value, Some(laptop()));
        assert_eq!(client.metrics().misses, 1);
    }

    #[tokio::test]
    async fn test_open_circuit_bypasses_cache() {
        let (client, store, _clock) = client_with(&["A"]);
        store.insert("product", "PROD-1", serde_json::to_value(laptop()).unwrap());
        client.circuit_breaker().force_open();

        let value: Option<Product> = client.get("product", "PROD-1", MINUTE).await.unwrap();
        assert_eq!(value, Some(laptop()));
        assert!(client.cluster().node("A").unwrap().is_empty());

        client.put("product", "PROD-2", &laptop(), MINUTE).await.unwrap();
        assert!(client.cluster().node("A").unwrap().is_empty());
        assert!(store.get("product", "PROD-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_circuit_write_drops_cached_copy() {
        let (client, store, _clock) = client_with(&["A", "B"]);
        client.put("cart", "USER-1", &json!("v1"), MINUTE).await.unwrap();
        let owner = client.cluster().owner_of("cart:USER-1").unwrap().unwrap();
        assert!(owner.exists("cart:USER-1"));

        client.circuit_breaker().force_open();
        client.put("cart", "USER-1", &json!("v2"), MINUTE).await.unwrap();

        assert!(!owner.exists("cart:USER-1"));
        assert_eq!(store.get("cart", "USER-1").await.unwrap(), Some(json!("v2")));
    }

    #[tokio::test]
    async fn test_write_through_populates_cache() {
        let (client, store, _clock) = client_with(&["A", "B"]);
        let cart = vec![json!({"product_id": "PROD-111", "quantity": 2})];
        let ttl = Duration::from_secs(1800);

        client.put("cart", "USER-789", &cart, ttl).await.unwrap();
        assert_eq!(
            store.get("cart", "USER-789").await.unwrap(),
            Some(json!(cart))
        );

        let cached: Option<Vec<Value>> = client.get("cart", "USER-789", ttl).await.unwrap();
        assert_eq!(cached, Some(cart));
        assert_eq!(client.metrics().hits, 1);
    }

    #[tokio::test]
    async fn test_configured_ttl_applies_without_explicit_ttl() {
        let mut config = RingCacheConfig::default();
        config.cluster.nodes = vec![seed_node("cache-node-1", "10.0.1.10")];
        config.client.product_ttl_seconds = 10;
        config.client.session_ttl_seconds = 20;

        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryBackingStore::new());
        store.insert("product", "PROD-1", serde_json::to_value(laptop()).unwrap());
        let client = CacheClient::from_config(&config, store, clock.clone()).unwrap();

        let _: Option<Product> = client.get("product", "PROD-1", None).await.unwrap();
        assert!(client.store_session("S1", &json!(1), None).unwrap());

        clock.advance(Duration::from_secs(11));
        let _: Option<Product> = client.get("product", "PROD-1", None).await.unwrap();
        assert_eq!(client.metrics().misses, 2);
        assert!(client.get_session::<Value>("S1").unwrap().is_some());

        clock.advance(Duration::from_secs(10));
        assert!(client.get_session::<Value>("S1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_read_omits_missing_ids() {
        let (client, store, _clock) = client_with(&["A", "B", "C"]);
        for i in 1..=3 {
            store.insert("product", &format!("PROD-{i}"), json!({"n": i}));
        }

        let ids = ["PROD-1", "PROD-2", "PROD-3", "PROD-404"];
        let results: HashMap<String, Value> =
            client.get_many("product", ids, MINUTE).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results["PROD-2"], json!({"n": 2}));
        assert_eq!(client.metrics().misses, 4);
    }

    #[tokio::test]
    async fn test_session_round_trip_and_expiry() {
        let (client, _store, clock) = client_with(&["A", "B"]);
        let session = json!({"email": "user@example.com"});

        assert!(client
            .store_session("SESSION-ABC123", &session, HOUR)
            .unwrap());
        let found: Option<Value> = client.get_session("SESSION-ABC123").unwrap();
        assert_eq!(found, Some(session));

        clock.advance(Duration::from_secs(3601));
        let expired: Option<Value> = client.get_session("SESSION-ABC123").unwrap();
        assert!(expired.is_none());

        let metrics = client.metrics();
        assert_eq!((metrics.hits, metrics.misses, metrics.fallbacks), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_session_write_with_open_circuit_drops_previous() {
        let (client, _store, _clock) = client_with(&["A"]);
        assert!(client.store_session("S1", &json!("old"), HOUR).unwrap());

        client.circuit_breaker().force_open();
        assert!(!client.store_session("S1", &json!("new"), HOUR).unwrap());

        client.circuit_breaker().force_closed();
        assert!(client.get_session::<Value>("S1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_without_nodes_is_not_found() {
        let (client, _store, _clock) = client_with(&[]);
        assert!(!client.store_session("S1", &json!({}), MINUTE).unwrap());
        assert!(client.get_session::<Value>("S1").unwrap().is_none());
        assert!(matches!(
            client.get_session::<Value>(""),
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_from_config_seeds_cluster() {
        let mut config = RingCacheConfig::default();
        config.cluster.nodes = vec![
            seed_node("cache-node-1", "10.0.1.10"),
            seed_node("cache-node-2", "10.0.1.11"),
        ];
        config.client.cart_ttl_seconds = 900;

        let clock: SharedClock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryBackingStore::new());
        let client = CacheClient::from_config(&config, store, clock).unwrap();
        assert_eq!(client.cluster().node_count(), 2);
        assert_eq!(client.settings().cart_ttl(), Duration::from_secs(900));
        assert_eq!(client.circuit_breaker().name(), "cache_path");
    }

    #[tokio::test]
    async fn test_invalidate_and_remove_session() {
        let (client, store, _clock) = client_with(&["A"]);
        store.insert("product", "PROD-1", serde_json::to_value(laptop()).unwrap());
        let _: Option<Product> = client.get("product", "PROD-1", MINUTE).await.unwrap();
        client.invalidate("product", "PROD-1").unwrap();
        assert!(client.cluster().node("A").unwrap().is_empty());

        client.store_session("S1", &json!(1), MINUTE).unwrap();
        client.remove_session("S1").unwrap();
        assert!(client.get_session::<Value>("S1").unwrap().is_none());
    }
}
