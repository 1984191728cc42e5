//! Injected timestamp sources
//!
//! The set never reads ambient time. Operations that do not take an explicit
//! timestamp ask a [`Clock`] supplied by the caller, which keeps replicas
//! deterministic under test.

use crate::record::Timestamp;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall-clock microseconds since the UNIX epoch.
///
/// Readings from one instance are strictly increasing even if the system
/// clock stalls or steps backwards, up to `u64::MAX`, where they saturate
/// and repeat.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Utc::now().timestamp_micros().max(0) as u64;
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => prev = current,
            }
        }
    }
}

/// Counter clock: every reading is one greater than the last.
///
/// The counter saturates at `u64::MAX`: once reached, every further reading
/// is `u64::MAX` and readings stop being distinct.
#[derive(Debug, Default)]
pub struct LogicalClock {
    counter: AtomicU64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// The first reading will be `start + 1`.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    /// Last value handed out
    pub fn current(&self) -> Timestamp {
        self.counter.load(Ordering::Acquire)
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> Timestamp {
        match self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_add(1))
        {
            Ok(prev) => prev + 1,
            Err(_) => Timestamp::MAX,
        }
    }
}

/// Always returns the same timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
