//! LWW Set Core - a state-based Last-Write-Wins Element Set CRDT
//!
//! Replicas accept `add` and `remove` of string elements without
//! coordination, exchange state at arbitrary times, and converge to the same
//! set once all state has propagated.
//!
//! # Example
//!
//! ```rust
//! use lwwset_core::{LWWElementSet, LogicalClock};
//!
//! let clock = LogicalClock::new();
//! let mut a = LWWElementSet::new();
//! let mut b = LWWElementSet::new();
//!
//! a.add("Groot", &clock);
//! b.merge(&a);
//! b.remove("Groot", &clock);
//! a.merge(&b);
//!
//! assert!(a.materialize().is_empty());
//! assert_eq!(a, b);
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod lattice;
pub mod log;
pub mod record;
pub mod replica;
pub mod set;

pub use clock::{Clock, FixedClock, LogicalClock, SystemClock};
pub use config::{Bias, SetConfig, SetConfigBuilder};
pub use error::{LwwError, Result};
pub use lattice::{DeltaCRDT, Lattice};
pub use log::Log;
pub use record::{Op, OpKind, Record, Timestamp};
pub use replica::{Replica, ReplicaId};
pub use set::{LWWElementSet, LWWSetDelta};
