//! IdGenerator port - ID 生成の抽象化
//!
//! Closure ID はプロセス全体で単調増加する必要がありますが、グローバル変数では
//! なく `Runtime` が所有するカウンタから払い出します。テストごとに独立した
//! カウンタを持てるようにするためです。

use std::cell::Cell;

use crate::domain::{ClosureId, EventId};

/// Issues serial identifiers.
pub trait IdGenerator {
    /// Strictly increasing across calls.
    fn next_closure_id(&self) -> ClosureId;

    fn next_event_id(&self) -> EventId;
}

/// Counter-backed generator; the first id issued is 1.
#[derive(Debug, Default)]
pub struct SerialIdGenerator {
    closures: Cell<u64>,
    events: Cell<u64>,
}

impl SerialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start closure numbering after `last` (e.g. to continue a previous run's sequence).
    pub fn starting_after(last: u64) -> Self {
        Self {
            closures: Cell::new(last),
            events: Cell::new(0),
        }
    }
}

fn bump(counter: &Cell<u64>) -> u64 {
    let next = counter
        .get()
        .checked_add(1)
        .expect("serial id counter overflowed");
    counter.set(next);
    next
}

impl IdGenerator for SerialIdGenerator {
    fn next_closure_id(&self) -> ClosureId {
        ClosureId::new(bump(&self.closures))
    }

    fn next_event_id(&self) -> EventId {
        EventId::new(bump(&self.events))
    }
}
