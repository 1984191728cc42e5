//! Last-Write-Wins Element Set (LWW-Set)
//!
//! The set keeps two compacted logs: an add log and a remove log (tombstones).
//! An element is present when its latest add is newer than its latest remove.
//! Equal timestamps are settled by the set's [`Bias`], never by storage order.
//!
//! Replicas accept `add`/`remove` locally without coordination and converge
//! once they have exchanged state through [`LWWElementSet::merge`], which is
//! commutative, associative and idempotent on both logs.
//!
//! # Equality
//!
//! `==` is structural: two sets are equal only if their materialized sets,
//! their add logs and their remove logs are all equal. Two replicas can show
//! the same elements while holding different histories, and those replicas
//! are *not* equal. Use [`LWWElementSet::converges_with`] to compare only the
//! visible contents.

use crate::clock::Clock;
use crate::config::{Bias, SetConfig};
use crate::error::{LwwError, Result};
use crate::lattice::{DeltaCRDT, Lattice};
use crate::log::Log;
use crate::record::{Op, Record, Timestamp};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LWWElementSet {
    add_log: Log,
    remove_log: Log,
    #[serde(default)]
    config: SetConfig,
    /// Records produced by local mutations since the last `split_delta`
    #[serde(skip)]
    pending_delta: Option<LWWSetDelta>,
}

/// Local changes not yet shipped to other replicas.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWSetDelta {
    pub adds: Log,
    pub removes: Log,
}

impl LWWSetDelta {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }
}

impl LWWElementSet {
    pub fn new() -> Self {
        Self::with_config(SetConfig::default())
    }

    pub fn with_config(config: SetConfig) -> Self {
        Self {
            add_log: Log::new(),
            remove_log: Log::new(),
            config,
            pending_delta: None,
        }
    }

    pub fn with_bias(bias: Bias) -> Self {
        Self::with_config(SetConfig { bias })
    }

    /// Rebuild a replica from existing logs.
    pub fn from_logs(add_log: Log, remove_log: Log) -> Self {
        Self {
            add_log,
            remove_log,
            ..Self::new()
        }
    }

    /// Rebuild a replica from raw, possibly duplicated records.
    pub fn from_records<A, R>(adds: A, removes: R) -> Self
    where
        A: IntoIterator<Item = Record>,
        R: IntoIterator<Item = Record>,
    {
        Self::from_logs(Log::compact(adds), Log::compact(removes))
    }

    /// Add `element`, stamped by `clock`. Returns the timestamp used.
    pub fn add<C: Clock + ?Sized>(&mut self, element: impl Into<String>, clock: &C) -> Timestamp {
        let timestamp = clock.now();
        self.add_at(element, timestamp);
        timestamp
    }

    /// Add `element` at an explicit timestamp.
    pub fn add_at(&mut self, element: impl Into<String>, timestamp: Timestamp) {
        let record = Record::new(element, timestamp);
        if self.add_log.insert(record.clone()) {
            self.pending_delta
                .get_or_insert_with(LWWSetDelta::default)
                .adds
                .insert(record);
        }
    }

    /// Remove `element`, stamped by `clock`. Returns the timestamp used.
    pub fn remove<C: Clock + ?Sized>(&mut self, element: impl Into<String>, clock: &C) -> Timestamp {
        let timestamp = clock.now();
        self.remove_at(element, timestamp);
        timestamp
    }

    /// Remove `element` at an explicit timestamp.
    ///
    /// Removing an element that was never added is legal: the tombstone
    /// outvotes any add with an older timestamp that arrives later.
    pub fn remove_at(&mut self, element: impl Into<String>, timestamp: Timestamp) {
        let record = Record::new(element, timestamp);
        if self.remove_log.insert(record.clone()) {
            self.pending_delta
                .get_or_insert_with(LWWSetDelta::default)
                .removes
                .insert(record);
        }
    }

    /// Merge another replica's state into this one. `other` is left untouched.
    pub fn merge(&mut self, other: &LWWElementSet) {
        if self.config.bias != other.config.bias {
            warn!(
                local = %self.config.bias,
                remote = %other.config.bias,
                "merging replicas with different tie-break policies"
            );
        }
        let adds = self.add_log.absorb(&other.add_log);
        let removes = self.remove_log.absorb(&other.remove_log);
        debug!(
            adds_changed = adds,
            removes_changed = removes,
            add_log = self.add_log.len(),
            remove_log = self.remove_log.len(),
            "merged replica state"
        );
    }

    /// The elements currently considered present.
    pub fn materialize(&self) -> BTreeSet<String> {
        self.add_log
            .iter()
            .filter(|record| self.resolves_present(&record.element, record.timestamp))
            .map(|record| record.element)
            .collect()
    }

    pub fn contains(&self, element: &str) -> bool {
        match self.add_log.get(element) {
            Some(added) => self.resolves_present(element, added),
            None => false,
        }
    }

    fn resolves_present(&self, element: &str, added: Timestamp) -> bool {
        self.config
            .bias
            .resolve(Some(added), self.remove_log.get(element))
    }

    /// Number of present elements
    pub fn len(&self) -> usize {
        self.materialize().len()
    }

    pub fn is_empty(&self) -> bool {
        !self
            .add_log
            .iter()
            .any(|record| self.resolves_present(&record.element, record.timestamp))
    }

    /// Every record tagged with its log, in replay order: by timestamp, then
    /// the tie-losing kind before the tie-winning kind, then by element.
    ///
    /// Replaying this sequence (add inserts, remove discards) yields exactly
    /// [`LWWElementSet::materialize`].
    pub fn history(&self) -> Vec<Op> {
        let winner = self.config.bias.winner();
        let mut ops: Vec<Op> = self
            .add_log
            .iter()
            .map(Op::add)
            .chain(self.remove_log.iter().map(Op::remove))
            .collect();
        ops.sort_by(|a, b| {
            (a.timestamp(), a.kind == winner, &a.record.element).cmp(&(
                b.timestamp(),
                b.kind == winner,
                &b.record.element,
            ))
        });
        ops
    }

    /// Semantic comparison: same visible elements, regardless of history.
    pub fn converges_with(&self, other: &LWWElementSet) -> bool {
        self.materialize() == other.materialize()
    }

    /// Equality against a value of any type.
    ///
    /// Fails with [`LwwError::TypeMismatch`] when `other` is not a set
    /// instead of quietly answering `false`. A boxed trait object is looked
    /// through, so `&Box<dyn Any>` holding a set compares as that set.
    pub fn equals_any(&self, other: &dyn Any) -> Result<bool> {
        if let Some(set) = other.downcast_ref::<LWWElementSet>() {
            return Ok(self == set);
        }
        if let Some(boxed) = other.downcast_ref::<Box<dyn Any>>() {
            return self.equals_any(boxed.as_ref());
        }
        Err(LwwError::TypeMismatch {
            expected: std::any::type_name::<LWWElementSet>().to_string(),
            found: "non-set value".to_string(),
        })
    }

    pub fn add_log(&self) -> &Log {
        &self.add_log
    }

    pub fn remove_log(&self) -> &Log {
        &self.remove_log
    }

    pub fn config(&self) -> &SetConfig {
        &self.config
    }

    pub fn bias(&self) -> Bias {
        self.config.bias
    }
}

impl Default for LWWElementSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for LWWElementSet {
    fn eq(&self, other: &Self) -> bool {
        self.add_log == other.add_log
            && self.remove_log == other.remove_log
            && self.materialize() == other.materialize()
    }
}

impl Eq for LWWElementSet {}

impl fmt::Display for LWWElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Add set: {}", self.add_log)?;
        writeln!(f, "Remove set: {}", self.remove_log)?;
        f.write_str("Resolved: {")?;
        for (i, element) in self.materialize().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", element)?;
        }
        f.write_str("}")
    }
}

impl Lattice for LWWElementSet {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            add_log: self.add_log.union(&other.add_log),
            remove_log: self.remove_log.union(&other.remove_log),
            config: self.config,
            pending_delta: None,
        }
    }

    fn join_assign(&mut self, other: &Self) {
        self.merge(other);
    }
}

impl Lattice for LWWSetDelta {
    fn bottom() -> Self {
        Self::default()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            adds: self.adds.union(&other.adds),
            removes: self.removes.union(&other.removes),
        }
    }
}

impl DeltaCRDT for LWWElementSet {
    type Delta = LWWSetDelta;

    fn split_delta(&mut self) -> Option<Self::Delta> {
        self.pending_delta.take()
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        let adds = self.add_log.absorb(&delta.adds);
        let removes = self.remove_log.absorb(&delta.removes);
        debug!(adds_changed = adds, removes_changed = removes, "applied delta");
    }
}

impl From<LWWSetDelta> for LWWElementSet {
    fn from(delta: LWWSetDelta) -> Self {
        Self::from_logs(delta.adds, delta.removes)
    }
}
