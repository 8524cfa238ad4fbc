//! 弱参照カウント
//!
//! 「相手がもうスコープ外か」を知りつつ、相手を生かし続けないポインタです。
//! 実際の寿命は `Rc` が決めます。ここでの weak count はそれとは別に手で
//! 管理する「論理的にまだ参照している人数」で、0 になると finalize が
//! スケジュールされます（その場では呼ばれません）。

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::flags::{Flag, HasMortality};
use crate::ports::{Action, Scheduler};

/// Manual weak count, starting at 1 (the owner's own reference).
pub struct WeakCount {
    count: Cell<usize>,
    finalize: RefCell<Option<Action>>,
    scheduler: Rc<dyn Scheduler>,
}

impl WeakCount {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            count: Cell::new(1),
            finalize: RefCell::new(None),
            scheduler,
        }
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub fn set_finalize(&self, action: Action) {
        *self.finalize.borrow_mut() = Some(action);
    }

    pub fn has_finalize(&self) -> bool {
        self.finalize.borrow().is_some()
    }

    pub fn incref(&self) {
        self.count.set(self.count.get() + 1);
    }

    /// Panics on underflow: more releases than references means the
    /// bookkeeping is corrupt.
    pub fn decref(&self) {
        let current = self.count.get();
        assert!(current > 0, "weak refcount underflow");
        self.count.set(current - 1);

        if current == 1 {
            // take() so it can fire at most once, even if the count climbs again
            let action = self.finalize.borrow_mut().take();
            if let Some(action) = action {
                tracing::trace!("weak count reached zero, scheduling finalize");
                self.scheduler.schedule(Duration::ZERO, action);
            }
        }
    }
}

impl fmt::Debug for WeakCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCount")
            .field("count", &self.count.get())
            .field("finalize", &self.has_finalize())
            .finish()
    }
}

/// Capability: mortality plus a manual weak count.
pub trait WeakRefCounted: HasMortality {
    fn weak_count(&self) -> &WeakCount;
}

/// Non-owning pointer that checks the target's `destroyed` flag before use.
///
/// Any `HasMortality` target can be observed; weak counting additionally
/// needs `WeakRefCounted`.
pub struct WeakRef<T> {
    pointer: Weak<T>,
    destroyed: Flag,
}

impl<T: HasMortality> WeakRef<T> {
    pub fn new(target: &Rc<T>) -> Self {
        Self {
            pointer: Rc::downgrade(target),
            destroyed: target.mortality().destroyed_flag(),
        }
    }

    /// The flag is consulted first; only a live target is handed out.
    pub fn pointer(&self) -> Option<Rc<T>> {
        if self.destroyed.get() {
            return None;
        }
        self.pointer.upgrade()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

}

impl<T: WeakRefCounted> WeakRef<T> {
    /// Forwarded to the target's `WeakCount` while it is still present.
    pub fn weak_incref(&self) {
        if let Some(target) = self.pointer() {
            target.weak_count().incref();
        }
    }

    pub fn weak_decref(&self) {
        if let Some(target) = self.pointer() {
            target.weak_count().decref();
        }
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        Self {
            pointer: self.pointer.clone(),
            destroyed: self.destroyed.clone(),
        }
    }
}

impl<T> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRef")
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}
