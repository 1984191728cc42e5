//! A replica: one LWW set plus the clock that stamps its local operations.

use crate::clock::Clock;
use crate::config::SetConfig;
use crate::lattice::DeltaCRDT;
use crate::record::Timestamp;
use crate::set::{LWWElementSet, LWWSetDelta};
use std::collections::BTreeSet;
use tracing::trace;
use ulid::Ulid;

/// Replica identifier
pub type ReplicaId = String;

/// A set owned by one node, stamping local operations with an injected clock.
///
/// The replica has no internal locking; wrap it in a mutex when several tasks
/// share it.
#[derive(Debug)]
pub struct Replica<C: Clock> {
    id: ReplicaId,
    clock: C,
    state: LWWElementSet,
}

impl<C: Clock> Replica<C> {
    pub fn new(id: impl Into<ReplicaId>, clock: C) -> Self {
        Self::with_config(id, clock, SetConfig::default())
    }

    /// Replica with a freshly generated ULID as its id
    pub fn generated(clock: C) -> Self {
        Self::new(Ulid::new().to_string(), clock)
    }

    pub fn with_config(id: impl Into<ReplicaId>, clock: C, config: SetConfig) -> Self {
        Self {
            id: id.into(),
            clock,
            state: LWWElementSet::with_config(config),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn add(&mut self, element: impl Into<String>) -> Timestamp {
        let element = element.into();
        let ts = self.state.add(element.as_str(), &self.clock);
        trace!(replica = %self.id, %element, ts, "add");
        ts
    }

    pub fn remove(&mut self, element: impl Into<String>) -> Timestamp {
        let element = element.into();
        let ts = self.state.remove(element.as_str(), &self.clock);
        trace!(replica = %self.id, %element, ts, "remove");
        ts
    }

    /// Merge another replica's current state into this one
    pub fn merge_from<D: Clock>(&mut self, other: &Replica<D>) {
        trace!(replica = %self.id, from = %other.id, "merge");
        self.state.merge(&other.state);
    }

    /// Merge state received from elsewhere
    pub fn receive(&mut self, state: &LWWElementSet) {
        self.state.merge(state);
    }

    pub fn receive_delta(&mut self, delta: &LWWSetDelta) {
        self.state.apply_delta(delta);
    }

    /// Local changes since the last call
    pub fn take_delta(&mut self) -> Option<LWWSetDelta> {
        self.state.split_delta()
    }

    pub fn contains(&self, element: &str) -> bool {
        self.state.contains(element)
    }

    pub fn materialize(&self) -> BTreeSet<String> {
        self.state.materialize()
    }

    pub fn state(&self) -> &LWWElementSet {
        &self.state
    }

    pub fn into_state(self) -> LWWElementSet {
        self.state
    }
}
