//! Frame-local storage and join group links.
//!
//! Join groups declared in a suspended frame are owned by that frame's arena
//! and addressed by slot index. A group records which arena (if any) holds it
//! through `GroupSite`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::ClosureId;
use crate::mortal::{HasMortality, MortalRef};

/// Where a join group's handle lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupSite {
    /// Heap-allocated, owned by whoever holds the handle.
    Detached,
    /// Slot `slot` of closure `owner`'s frame arena.
    Frame { owner: ClosureId, slot: usize },
}

/// Closure -> join group association.
///
/// `site` is for diagnostics only; every linked group is killed with the
/// closure whatever its site.
#[derive(Debug, Clone)]
pub struct GroupLink {
    pub mortal: MortalRef,
    pub site: GroupSite,
}

/// Strong owner of frame-local join groups.
#[derive(Default)]
pub(crate) struct FrameArena {
    slots: RefCell<Vec<Option<Rc<dyn HasMortality>>>>,
}

impl FrameArena {
    pub(crate) fn alloc(&self, resident: Rc<dyn HasMortality>) -> usize {
        let mut slots = self.slots.borrow_mut();
        slots.push(Some(resident));
        slots.len() - 1
    }

    /// Snapshot of the residents still held, so callers can run `mark_dead`
    /// without holding the borrow.
    pub(crate) fn residents(&self) -> Vec<Rc<dyn HasMortality>> {
        self.slots.borrow().iter().flatten().cloned().collect()
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.borrow().iter().flatten().count()
    }

    /// Drop every slot. The emptied vector is returned so its contents drop
    /// after the borrow is released (a resident's `Drop` may call back in).
    pub(crate) fn release_all(&self) -> Vec<Option<Rc<dyn HasMortality>>> {
        std::mem::take(&mut *self.slots.borrow_mut())
    }
}
