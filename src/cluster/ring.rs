//! # Consistent Hash Ring
//!
//! Places every physical [`CacheNode`] at `virtual_nodes_per_node` points on a
//! 64-bit ring and routes a key to the first point at or after the key's own
//! hash, wrapping past the top of the ring. Adding or removing a node only
//! moves the keys that fall into that node's intervals.
//!
//! Health is read from the nodes at lookup time. An unhealthy node keeps its
//! ring positions; lookups simply walk past it.

use crate::cluster::node::CacheNode;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Ring position for an arbitrary string: the first 8 bytes of its SHA-256
/// digest, big-endian.
pub fn hash_key(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Key hashed for the `index`-th virtual position of a node
fn virtual_node_key(node_id: &str, index: usize) -> String {
    format!("{node_id}#{index}")
}

/// Sorted map of hash positions to physical nodes
#[derive(Debug, Clone)]
pub struct HashRing {
    ring: BTreeMap<u64, Arc<CacheNode>>,
    virtual_nodes_per_node: usize,
}

impl HashRing {
    pub fn new(virtual_nodes_per_node: usize) -> Self {
        Self {
            ring: BTreeMap::new(),
            virtual_nodes_per_node,
        }
    }

    pub fn virtual_nodes_per_node(&self) -> usize {
        self.virtual_nodes_per_node
    }

    /// Number of occupied ring positions
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Distinct physical nodes present on the ring
    pub fn node_count(&self) -> usize {
        self.ring
            .values()
            .map(|node| node.id())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Insert all virtual positions for `node`.
    ///
    /// Adding a node that is already on the ring is not guarded here.
    pub fn add_node(&mut self, node: Arc<CacheNode>) {
        for index in 0..self.virtual_nodes_per_node {
            let position = hash_key(&virtual_node_key(node.id(), index));
            self.ring.insert(position, Arc::clone(&node));
        }
    }

    /// Remove every virtual position owned by `node`; a no-op for unknown
    /// nodes.
    pub fn remove_node(&mut self, node: &CacheNode) {
        for index in 0..self.virtual_nodes_per_node {
            let position = hash_key(&virtual_node_key(node.id(), index));
            if self
                .ring
                .get(&position)
                .is_some_and(|owner| owner.id() == node.id())
            {
                self.ring.remove(&position);
            }
        }
    }

    /// Walk the ring once, starting at the first position `>= hash`.
    fn walk_from(&self, hash: u64) -> impl Iterator<Item = &Arc<CacheNode>> {
        self.ring
            .range(hash..)
            .chain(self.ring.range(..hash))
            .map(|(_, node)| node)
    }

    /// Owner of `key`, skipping forward past unhealthy nodes.
    ///
    /// Returns `None` when the ring is empty or holds no healthy node.
    pub fn get_primary_node(&self, key: &str) -> Option<Arc<CacheNode>> {
        self.walk_from(hash_key(key))
            .find(|node| node.is_healthy())
            .cloned()
    }

    /// Up to `count` distinct healthy physical nodes in ring order from the
    /// key's position. The first entry is the primary.
    pub fn get_replica_nodes(&self, key: &str, count: usize) -> Vec<Arc<CacheNode>> {
        if count == 0 {
            return Vec::new();
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(count);
        let mut replicas = Vec::with_capacity(count);
        for node in self.walk_from(hash_key(key)) {
            if !node.is_healthy() || !seen.insert(node.id()) {
                continue;
            }
            replicas.push(Arc::clone(node));
            if replicas.len() == count {
                break;
            }
        }
        replicas
    }

    /// Owner of `key` ignoring health
    pub fn owner_of(&self, key: &str) -> Option<Arc<CacheNode>> {
        self.walk_from(hash_key(key)).next().cloned()
    }
}
