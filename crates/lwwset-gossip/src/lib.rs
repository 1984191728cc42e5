//! LWW Set Gossip - in-memory replication harness
//!
//! Drives a cluster of [`lwwset_core::Replica`]s over a simulated network
//! that can drop, duplicate and reorder messages. Nothing here touches a real
//! socket; the point is to show that whole-state and delta-state pushes
//! converge no matter how delivery misbehaves.
//!
//! ```text
//! On local mutation:
//!   X = X ⊔ {(e, now)}          // add log or remove log
//!
//! On push to peer j:
//!   send X (or the local delta) to j
//!
//! On receive s:
//!   X = X ⊔ s                   // idempotent, order-free
//! ```
//!
//! # Example
//!
//! ```rust
//! use lwwset_gossip::{GossipCluster, NetworkConfig};
//!
//! let mut cluster = GossipCluster::new(3, NetworkConfig::chaotic());
//! cluster.add(0, "Groot");
//! cluster.remove(1, "Groot");
//! cluster.add(2, "Rocket");
//!
//! while !cluster.is_converged() {
//!     cluster.full_sync_round();
//!     cluster.retransmit_and_process();
//! }
//! assert!(cluster.replica(0).contains("Rocket"));
//! ```

pub mod cluster;
pub mod network;

pub use cluster::{GossipCluster, GossipMessage};
pub use network::{NetworkConfig, NetworkSimulator};
