//! Status - ランタイムの統計
//!
//! Counters are plain `Cell`s bumped on the hot paths; `RuntimeStats` is the
//! serializable snapshot.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    pub closures_created: u64,
    pub events_created: u64,
    pub events_triggered: u64,
    pub events_cancelled: u64,
    pub joins_delivered: u64,
    pub violations: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) closures_created: Cell<u64>,
    pub(crate) events_created: Cell<u64>,
    pub(crate) events_triggered: Cell<u64>,
    pub(crate) events_cancelled: Cell<u64>,
    pub(crate) joins_delivered: Cell<u64>,
    pub(crate) violations: Cell<u64>,
}

pub(crate) fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

impl StatsCounters {
    pub(crate) fn snapshot(&self) -> RuntimeStats {
        RuntimeStats {
            closures_created: self.closures_created.get(),
            events_created: self.events_created.get(),
            events_triggered: self.events_triggered.get(),
            events_cancelled: self.events_cancelled.get(),
            joins_delivered: self.joins_delivered.get(),
            violations: self.violations.get(),
        }
    }
}
