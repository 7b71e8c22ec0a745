//! Cluster and client builders shared by integration tests

#![allow(dead_code)] // Not every test binary uses every builder

use ring_cache::client::{BackingStore, CacheClient};
use ring_cache::clock::{ManualClock, SharedClock};
use ring_cache::cluster::DistributedCacheSystem;
use ring_cache::resilience::{CircuitBreaker, CircuitBreakerConfig};
use std::sync::Arc;
use std::time::Duration;

/// Builder for a cluster driven by a manual clock
pub struct ClusterBuilder {
    replication_factor: usize,
    virtual_nodes_per_node: usize,
    node_ids: Vec<String>,
    clock: Arc<ManualClock>,
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self {
            replication_factor: 2,
            virtual_nodes_per_node: 150,
            node_ids: Vec::new(),
            clock: Arc::new(ManualClock::new(1_000)),
        }
    }

    pub fn with_replication_factor(mut self, replication_factor: usize) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    pub fn with_virtual_nodes(mut self, virtual_nodes_per_node: usize) -> Self {
        self.virtual_nodes_per_node = virtual_nodes_per_node;
        self
    }

    pub fn with_nodes(mut self, ids: &[&str]) -> Self {
        self.node_ids.extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn build(self) -> (Arc<DistributedCacheSystem>, Arc<ManualClock>) {
        let shared: SharedClock = self.clock.clone();
        let cluster = Arc::new(DistributedCacheSystem::new(
            self.replication_factor,
            self.virtual_nodes_per_node,
            shared,
        ));
        for (index, id) in self.node_ids.iter().enumerate() {
            let host = format!("10.0.1.{}", 10 + index);
            cluster
                .add_node(cluster.create_node(id, &host, 6379))
                .expect("test node ids are unique");
        }
        (cluster, self.clock)
    }
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client over `cluster` with a breaker that opens after `failure_threshold`
/// failures and cools down for `timeout`
pub fn client_with_breaker(
    cluster: Arc<DistributedCacheSystem>,
    store: Arc<dyn BackingStore>,
    clock: Arc<ManualClock>,
    failure_threshold: u32,
    timeout: Duration,
) -> CacheClient {
    let breaker = Arc::new(CircuitBreaker::new(
        "cache_path",
        CircuitBreakerConfig {
            failure_threshold,
            timeout,
        },
        clock,
    ));
    CacheClient::new(cluster, store, breaker)
}

/// Client with the default cache-path breaker settings
pub fn client_for(
    cluster: Arc<DistributedCacheSystem>,
    store: Arc<dyn BackingStore>,
    clock: Arc<ManualClock>,
) -> CacheClient {
    let defaults = CircuitBreakerConfig::for_cache_path();
    client_with_breaker(
        cluster,
        store,
        clock,
        defaults.failure_threshold,
        defaults.timeout,
    )
}
