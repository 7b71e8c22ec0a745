//! # Cluster Module
//!
//! Cache nodes, the consistent hash ring that routes keys onto them, and the
//! [`DistributedCacheSystem`] that keeps node membership and ring placement
//! in step.
//!
//! ## Usage
//!
//! ```rust
//! use ring_cache::clock::system_clock;
//! use ring_cache::cluster::DistributedCacheSystem;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cluster = DistributedCacheSystem::new(2, 150, system_clock());
//! cluster.add_node(cluster.create_node("cache-node-1", "10.0.1.10", 6379))?;
//! cluster.add_node(cluster.create_node("cache-node-2", "10.0.1.11", 6379))?;
//!
//! let primary = cluster.get_node_for_key("product:PROD-12345")?;
//! assert!(primary.is_some());
//! assert_eq!(cluster.get_replica_nodes("product:PROD-12345", None)?.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod node;
pub mod ring;
pub mod system;

pub use node::CacheNode;
pub use ring::{hash_key, HashRing};
pub use system::{ClusterStatus, DistributedCacheSystem};
