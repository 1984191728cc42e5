//! Timestamped operation records
//!
//! A [`Record`] is one historical add or remove: the element and the time the
//! operation was issued. Records are immutable; two records are the same
//! record only if both fields match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal timestamp attached to every operation.
///
/// Either a logical counter or wall-clock microseconds; only the total order
/// matters to the set.
pub type Timestamp = u64;

/// One historical operation on an element.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Record {
    pub element: String,
    pub timestamp: Timestamp,
}

impl Record {
    pub fn new(element: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            element: element.into(),
            timestamp,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {})", self.element, self.timestamp)
    }
}

impl<S: Into<String>> From<(S, Timestamp)> for Record {
    fn from((element, timestamp): (S, Timestamp)) -> Self {
        Self::new(element, timestamp)
    }
}

/// Which log a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Add,
    Remove,
}

/// A record tagged with the log it came from, as replayed by resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Op {
    pub kind: OpKind,
    pub record: Record,
}

impl Op {
    pub fn add(record: Record) -> Self {
        Self {
            kind: OpKind::Add,
            record,
        }
    }

    pub fn remove(record: Record) -> Self {
        Self {
            kind: OpKind::Remove,
            record,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.record.timestamp
    }
}
