//! A cluster of replicas gossiping over a [`NetworkSimulator`]

use crate::network::{NetworkConfig, NetworkSimulator};
use lwwset_core::{
    LWWElementSet, LWWSetDelta, LogicalClock, Replica, ReplicaId, SetConfig, Timestamp,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// What one replica pushes to another
#[derive(Debug, Clone)]
pub enum GossipMessage {
    /// Full replica state
    State {
        from: ReplicaId,
        to: ReplicaId,
        state: LWWElementSet,
    },
    /// Only the records mutated locally since the sender's last push
    Delta {
        from: ReplicaId,
        to: ReplicaId,
        delta: LWWSetDelta,
    },
}

impl GossipMessage {
    pub fn to(&self) -> &str {
        match self {
            GossipMessage::State { to, .. } | GossipMessage::Delta { to, .. } => to,
        }
    }
}

/// Replicas sharing one logical clock, so operations issued later in a test
/// always carry larger timestamps.
#[derive(Debug)]
pub struct GossipCluster {
    replicas: Vec<Replica<Arc<LogicalClock>>>,
    network: NetworkSimulator<GossipMessage>,
    clock: Arc<LogicalClock>,
    delivered: usize,
}

impl GossipCluster {
    pub fn new(n: usize, network: NetworkConfig) -> Self {
        Self::with_config(n, network, SetConfig::default())
    }

    pub fn with_config(n: usize, network: NetworkConfig, config: SetConfig) -> Self {
        let clock = Arc::new(LogicalClock::new());
        let replicas = (0..n)
            .map(|i| Replica::with_config(format!("replica_{}", i), Arc::clone(&clock), config))
            .collect();

        Self {
            replicas,
            network: NetworkSimulator::new(network),
            clock,
            delivered: 0,
        }
    }

    pub fn replica(&self, idx: usize) -> &Replica<Arc<LogicalClock>> {
        &self.replicas[idx]
    }

    pub fn replica_mut(&mut self, idx: usize) -> &mut Replica<Arc<LogicalClock>> {
        &mut self.replicas[idx]
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub fn network(&self) -> &NetworkSimulator<GossipMessage> {
        &self.network
    }

    pub fn add(&mut self, idx: usize, element: impl Into<String>) -> Timestamp {
        self.replicas[idx].add(element)
    }

    pub fn remove(&mut self, idx: usize, element: impl Into<String>) -> Timestamp {
        self.replicas[idx].remove(element)
    }

    /// Send the full state of `from` to `to`
    pub fn push_state(&mut self, from: usize, to: usize) {
        let msg = GossipMessage::State {
            from: self.replicas[from].id().to_string(),
            to: self.replicas[to].id().to_string(),
            state: self.replicas[from].state().clone(),
        };
        self.network.send(msg);
    }

    /// Send the local changes of `from` to every other replica.
    ///
    /// Returns `false` if there was nothing to send.
    pub fn push_delta(&mut self, from: usize) -> bool {
        let delta = match self.replicas[from].take_delta() {
            Some(delta) if !delta.is_empty() => delta,
            _ => return false,
        };

        let sender = self.replicas[from].id().to_string();
        for to in 0..self.replicas.len() {
            if to != from {
                self.network.send(GossipMessage::Delta {
                    from: sender.clone(),
                    to: self.replicas[to].id().to_string(),
                    delta: delta.clone(),
                });
            }
        }
        true
    }

    /// Push the full state of `from` to every other replica
    pub fn broadcast(&mut self, from: usize) {
        for to in 0..self.replicas.len() {
            if to != from {
                self.push_state(from, to);
            }
        }
    }

    /// Deliver one message. Returns `false` when nothing is in flight.
    pub fn process_one(&mut self) -> bool {
        let Some(msg) = self.network.receive() else {
            return false;
        };

        let Some(replica) = self.replicas.iter_mut().find(|r| r.id() == msg.to()) else {
            trace!(to = msg.to(), "dropping message for unknown replica");
            return true;
        };

        match &msg {
            GossipMessage::State { from, state, .. } => {
                trace!(%from, to = replica.id(), "deliver state");
                replica.receive(state);
            }
            GossipMessage::Delta { from, delta, .. } => {
                trace!(%from, to = replica.id(), "deliver delta");
                replica.receive_delta(delta);
            }
        }
        self.delivered += 1;
        true
    }

    pub fn drain_network(&mut self) {
        while self.process_one() {}
    }

    /// Every replica pushes its full state to every other replica
    pub fn full_sync_round(&mut self) {
        let n = self.replicas.len();
        for from in 0..n {
            self.broadcast(from);
        }
        self.drain_network();
        debug!(
            delivered = self.delivered,
            lost = self.network.lost_count(),
            "sync round complete"
        );
    }

    /// Every replica pushes its pending delta
    pub fn delta_round(&mut self) {
        for from in 0..self.replicas.len() {
            self.push_delta(from);
        }
        self.drain_network();
    }

    pub fn retransmit_and_process(&mut self) {
        self.network.retransmit_lost();
        self.drain_network();
    }

    /// All replicas hold identical logs and materialized sets
    pub fn is_converged(&self) -> bool {
        match self.replicas.split_first() {
            Some((first, rest)) => rest.iter().all(|r| r.state() == first.state()),
            None => true,
        }
    }

    pub fn materialized(&self, idx: usize) -> BTreeSet<String> {
        self.replicas[idx].materialize()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_basic_convergence() {
        let mut cluster = GossipCluster::new(3, NetworkConfig::default());
        cluster.add(0, "Groot");
        cluster.add(1, "Rocket");

        assert!(!cluster.is_converged());
        cluster.full_sync_round();
        assert!(cluster.is_converged());

        for i in 0..3 {
            assert!(cluster.replica(i).contains("Groot"));
            assert!(cluster.replica(i).contains("Rocket"));
        }
    }

    #[test]
    fn test_push_delta_only_when_changed() {
        let mut cluster = GossipCluster::new(2, NetworkConfig::default());
        assert!(!cluster.push_delta(0));

        cluster.add(0, "Drax");
        assert!(cluster.push_delta(0));
        assert_eq!(cluster.network().in_flight_count(), 1);
        assert!(!cluster.push_delta(0));

        cluster.drain_network();
        assert!(cluster.replica(1).contains("Drax"));
        assert_eq!(cluster.delivered_count(), 1);
    }

    #[test]
    fn test_direct_replica_access_shares_cluster_clock() {
        let mut cluster = GossipCluster::new(2, NetworkConfig::default());
        cluster.add(0, "Groot");

        let ts = cluster.replica_mut(1).remove("Groot");
        assert_eq!(ts, 2);
        assert_eq!(cluster.clock().current(), 2);

        cluster.full_sync_round();
        assert!(cluster.is_converged());
        assert!(cluster.materialized(0).is_empty());
    }

    #[test]
    fn test_message_recipient() {
        let msg = GossipMessage::Delta {
            from: "a".to_string(),
            to: "b".to_string(),
            delta: LWWSetDelta::default(),
        };
        assert_eq!(msg.to(), "b");
    }

    #[test]
    fn test_idempotence_repeated_resends() {
        let mut cluster = GossipCluster::new(2, NetworkConfig::default());
        cluster.add(0, "Groot");

        let initial = cluster.replica(1).state().clone();
        cluster.full_sync_round();
        let after_one = cluster.replica(1).state().clone();

        for _ in 0..10 {
            cluster.full_sync_round();
        }
        let after_many = cluster.replica(1).state().clone();

        assert_eq!(after_one, after_many);
        assert_ne!(initial, after_one);
    }
}
