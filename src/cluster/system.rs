//! # Distributed Cache System
//!
//! Owns the node registry and the hash ring. Both live behind a single
//! `RwLock` so a membership change is one atomic step for routing readers:
//! no lookup can see a node in the registry that is missing from the ring, or
//! the reverse.

use crate::clock::SharedClock;
use crate::cluster::node::CacheNode;
use crate::cluster::ring::HashRing;
use crate::config::ClusterConfig;
use crate::error::{validate_key, CacheError, CacheResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
struct Topology {
    nodes: Vec<Arc<CacheNode>>,
    ring: HashRing,
}

/// Point-in-time view of cluster membership and health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub total_nodes: usize,
    pub healthy_nodes: usize,
    pub replication_factor: usize,
    pub virtual_nodes_per_node: usize,
    pub ring_positions: usize,
    pub captured_at: DateTime<Utc>,
}

/// Cluster registry plus consistent-hash routing
#[derive(Debug)]
pub struct DistributedCacheSystem {
    topology: RwLock<Topology>,
    replication_factor: usize,
    clock: SharedClock,
}

impl DistributedCacheSystem {
    /// Create an empty cluster.
    pub fn new(
        replication_factor: usize,
        virtual_nodes_per_node: usize,
        clock: SharedClock,
    ) -> Self {
        info!(
            replication_factor = replication_factor,
            virtual_nodes_per_node = virtual_nodes_per_node,
            "Distributed cache system initialized"
        );

        Self {
            topology: RwLock::new(Topology {
                nodes: Vec::new(),
                ring: HashRing::new(virtual_nodes_per_node),
            }),
            replication_factor,
            clock,
        }
    }

    /// Build a cluster and register the configured seed nodes in order.
    pub fn from_config(config: &ClusterConfig, clock: SharedClock) -> CacheResult<Self> {
        config.validate()?;

        let system = Self::new(
            config.replication_factor,
            config.virtual_nodes_per_node,
            clock,
        );
        for seed in &config.nodes {
            system.add_node(system.create_node(&seed.id, &seed.host, seed.port))?;
        }
        Ok(system)
    }

    /// Construct a node sharing this cluster's clock. The node is not
    /// registered until passed to [`add_node`](Self::add_node).
    pub fn create_node(&self, id: &str, host: &str, port: u16) -> Arc<CacheNode> {
        Arc::new(CacheNode::new(id, host, port, Arc::clone(&self.clock)))
    }

    /// Register `node` and place it on the ring.
    pub fn add_node(&self, node: Arc<CacheNode>) -> CacheResult<()> {
        validate_key("node id", node.id())?;

        let mut topology = self.topology.write();
        if topology.nodes.iter().any(|n| n.id() == node.id()) {
            return Err(CacheError::DuplicateNode(node.id().to_string()));
        }

        topology.ring.add_node(Arc::clone(&node));
        topology.nodes.push(Arc::clone(&node));

        info!(
            node_id = %node.id(),
            address = %node.address(),
            cluster_size = topology.nodes.len(),
            "Added cache node"
        );
        Ok(())
    }

    /// Deregister a node and drop all of its ring positions. Keys it held are
    /// not migrated.
    pub fn remove_node(&self, node_id: &str) -> CacheResult<Arc<CacheNode>> {
        let mut topology = self.topology.write();
        let index = topology
            .nodes
            .iter()
            .position(|n| n.id() == node_id)
            .ok_or_else(|| CacheError::NodeNotFound(node_id.to_string()))?;

        let node = topology.nodes.remove(index);
        topology.ring.remove_node(&node);

        info!(
            node_id = %node.id(),
            cluster_size = topology.nodes.len(),
            discarded_entries = node.len(),
            "Removed cache node"
        );
        Ok(node)
    }

    /// Primary node for `key`, or `None` when no healthy node is available.
    pub fn get_node_for_key(&self, key: &str) -> CacheResult<Option<Arc<CacheNode>>> {
        validate_key("cache key", key)?;
        let node = self.topology.read().ring.get_primary_node(key);
        debug!(
            key = key,
            node_id = node.as_ref().map(|n| n.id()),
            "Routed key to primary node"
        );
        Ok(node)
    }

    /// Node owning `key` on the ring regardless of health.
    pub fn owner_of(&self, key: &str) -> CacheResult<Option<Arc<CacheNode>>> {
        validate_key("cache key", key)?;
        Ok(self.topology.read().ring.owner_of(key))
    }

    /// Distinct healthy replica nodes for `key`; `count` defaults to the
    /// replication factor.
    pub fn get_replica_nodes(
        &self,
        key: &str,
        count: Option<usize>,
    ) -> CacheResult<Vec<Arc<CacheNode>>> {
        validate_key("cache key", key)?;
        let count = count.unwrap_or(self.replication_factor);
        Ok(self.topology.read().ring.get_replica_nodes(key, count))
    }

    pub fn get_healthy_node_count(&self) -> usize {
        self.topology
            .read()
            .nodes
            .iter()
            .filter(|n| n.is_healthy())
            .count()
    }

    /// Registered nodes in insertion order
    pub fn nodes(&self) -> Vec<Arc<CacheNode>> {
        self.topology.read().nodes.clone()
    }

    pub fn node(&self, node_id: &str) -> Option<Arc<CacheNode>> {
        self.topology
            .read()
            .nodes
            .iter()
            .find(|n| n.id() == node_id)
            .cloned()
    }

    pub fn node_count(&self) -> usize {
        self.topology.read().nodes.len()
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    pub fn virtual_nodes_per_node(&self) -> usize {
        self.topology.read().ring.virtual_nodes_per_node()
    }

    pub fn cluster_status(&self) -> ClusterStatus {
        let topology = self.topology.read();
        ClusterStatus {
            total_nodes: topology.nodes.len(),
            healthy_nodes: topology.nodes.iter().filter(|n| n.is_healthy()).count(),
            replication_factor: self.replication_factor,
            virtual_nodes_per_node: topology.ring.virtual_nodes_per_node(),
            ring_positions: topology.ring.len(),
            captured_at: Utc::now(),
        }
    }

    /// Count of `keys` routed to each node id. Keys with no available node
    /// are not counted.
    pub fn key_distribution<I, K>(&self, keys: I) -> BTreeMap<String, usize>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let topology = self.topology.read();
        let mut distribution = BTreeMap::new();
        for key in keys {
            if let Some(node) = topology.ring.get_primary_node(key.as_ref()) {
                *distribution.entry(node.id().to_string()).or_insert(0) += 1;
            }
        }
        distribution
    }
}
