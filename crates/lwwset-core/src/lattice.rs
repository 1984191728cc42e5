//! Join-semilattice trait behind replica merging
//!
//! A state-based CRDT is a join-semilattice (S, ⊔) where:
//!  - Commutativity: a ⊔ b = b ⊔ a
//!  - Associativity: (a ⊔ b) ⊔ c = a ⊔ (b ⊔ c)
//!  - Idempotence:  a ⊔ a = a
//!
//! For the LWW element set the join is the per-element maximum over both the
//! add log and the remove log, so replica state can be delivered late,
//! out of order, or more than once.

use std::cmp::Ordering;

/// State that can be merged with any other replica's state.
pub trait Lattice: Clone + PartialEq {
    /// The bottom element (identity for join)
    fn bottom() -> Self;

    /// Least upper bound of `self` and `other`
    fn join(&self, other: &Self) -> Self;

    /// Partial order derived from join:  a ≤ b iff a ⊔ b = b
    fn partial_cmp_lattice(&self, other: &Self) -> Option<Ordering> {
        let joined = self.join(other);
        match (&joined == self, &joined == other) {
            (true, true) => Some(Ordering::Equal),
            (false, true) => Some(Ordering::Less),
            (true, false) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }

    /// Check if self ≤ other in the lattice order
    fn leq(&self, other: &Self) -> bool {
        matches!(
            self.partial_cmp_lattice(other),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )
    }

    /// Join-assign:  self = self ⊔ other
    fn join_assign(&mut self, other: &Self) {
        *self = self.join(other);
    }
}

/// CRDTs that can ship only what changed locally instead of full state.
pub trait DeltaCRDT: Lattice {
    /// The delta state type
    type Delta: Lattice;

    /// Take the delta accumulated by local mutations since the last split
    fn split_delta(&mut self) -> Option<Self::Delta>;

    /// Join a delta received from another replica
    fn apply_delta(&mut self, delta: &Self::Delta);
}
