//! 生きているイベントの登録簿と、終了時のリーク報告。
//!
//! 登録簿は `EventId` をキーにした弱参照の表です。イベントは drop 時に
//! 自分のエントリを外すので、表の大きさは生存中のイベント数に比例します。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::state::EventState;
use crate::app::Runtime;
use crate::domain::{EventId, Location};
use crate::error::Violation;

/// Read-only view of an event, enough to audit it.
pub trait EventStatus {
    fn id(&self) -> EventId;
    fn location(&self) -> Location;
    fn state(&self) -> EventState;
}

/// Every live event created through a runtime, keyed (and so ordered) by id.
#[derive(Default)]
pub(crate) struct EventRegistry {
    entries: RefCell<BTreeMap<EventId, Weak<dyn EventStatus>>>,
}

impl EventRegistry {
    pub(crate) fn register(&self, id: EventId, event: Weak<dyn EventStatus>) {
        self.entries.borrow_mut().insert(id, event);
    }

    /// Called from the event's `Drop`.
    pub(crate) fn unregister(&self, id: EventId) {
        self.entries.borrow_mut().remove(&id);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Events still alive, in creation order.
    ///
    /// The strong handles are returned after the borrow ends, so dropping
    /// them may unregister freely.
    pub(crate) fn live(&self) -> Vec<Rc<dyn EventStatus>> {
        self.entries
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

/// Report every event in `events` that is still pending, one report per
/// event at its own location. Returns the number reported.
pub fn report_leaks<'a, S>(rt: &Runtime, events: impl IntoIterator<Item = &'a S>) -> usize
where
    S: EventStatus + ?Sized + 'a,
{
    let mut leaked = 0;
    for event in events {
        if event.state().is_terminal() {
            continue;
        }
        tracing::debug!(event = %event.id(), location = %event.location(), "event leaked");
        rt.report(&event.location(), Violation::LeakedEvent);
        leaked += 1;
    }
    leaked
}
