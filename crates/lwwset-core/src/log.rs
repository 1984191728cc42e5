//! Compacted operation logs
//!
//! Both the add log and the remove log of a set are a [`Log`]: at most one
//! record per element, holding the greatest timestamp seen for it. Keeping
//! the log as a map keyed by element makes compaction incremental, so an
//! insert costs O(log n) instead of a full sort-and-group pass.

use crate::record::{Record, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Log {
    latest: BTreeMap<String, Timestamp>,
}

impl Log {
    pub fn new() -> Self {
        Self {
            latest: BTreeMap::new(),
        }
    }

    /// Compact an arbitrary record sequence down to one record per element,
    /// keeping the maximum timestamp.
    pub fn compact<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut log = Self::new();
        for record in records {
            log.insert(record);
        }
        log
    }

    /// Insert a record, keeping only the newest one for its element.
    ///
    /// Returns `true` if the log changed.
    pub fn insert(&mut self, record: Record) -> bool {
        match self.latest.get_mut(&record.element) {
            Some(ts) if *ts >= record.timestamp => {
                trace!(element = %record.element, kept = *ts, dropped = record.timestamp, "compacted stale record");
                false
            }
            Some(ts) => {
                trace!(element = %record.element, from = *ts, to = record.timestamp, "superseded record");
                *ts = record.timestamp;
                true
            }
            None => {
                self.latest.insert(record.element, record.timestamp);
                true
            }
        }
    }

    /// Join another log into this one. Returns the number of records that changed.
    pub fn absorb(&mut self, other: &Log) -> usize {
        let mut changed = 0;
        for record in other.iter() {
            if self.insert(record) {
                changed += 1;
            }
        }
        changed
    }

    /// Compacted union of two logs
    pub fn union(&self, other: &Log) -> Log {
        let mut merged = self.clone();
        merged.absorb(other);
        merged
    }

    /// Latest timestamp recorded for `element`
    pub fn get(&self, element: &str) -> Option<Timestamp> {
        self.latest.get(element).copied()
    }

    pub fn contains(&self, element: &str) -> bool {
        self.latest.contains_key(element)
    }

    pub fn contains_record(&self, record: &Record) -> bool {
        self.get(&record.element) == Some(record.timestamp)
    }

    /// Records in element order
    pub fn iter(&self) -> impl Iterator<Item = Record> + '_ {
        self.latest
            .iter()
            .map(|(element, ts)| Record::new(element.clone(), *ts))
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.latest.keys().map(String::as_str)
    }

    pub fn records(&self) -> Vec<Record> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

impl FromIterator<Record> for Log {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::compact(iter)
    }
}

impl Extend<Record> for Log {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, record) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", record)?;
        }
        f.write_str("}")
    }
}
