//! Mortality フラグ（`destroyed` と `dead`）
//!
//! # 設計
//! - 2 つのフラグは独立に共有される（observer は片方だけ持てる）
//! - `destroyed` は所有者の drop で一度だけ立つ
//! - `dead` はそれより前に立ちうる、アプリケーションレベルの「終わった」印
//!
//! Observers never keep the owner alive; they only keep the flag cells alive.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared boolean cell: one writer (the owner), any number of readers.
#[derive(Clone, Default)]
pub struct Flag(Rc<Cell<bool>>);

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> bool {
        self.0.get()
    }

    /// Set the flag. Returns `true` if this call flipped it.
    fn raise(&self) -> bool {
        !self.0.replace(true)
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flag({})", self.get())
    }
}

/// The owner's half of the mortality state.
///
/// Not `Clone`: exactly one owner. Dropping it (i.e. dropping the struct that
/// embeds it) raises `destroyed`.
#[derive(Debug, Default)]
pub struct MortalityFlags {
    destroyed: Flag,
    dead: Flag,
}

impl MortalityFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destroyed_flag(&self) -> Flag {
        self.destroyed.clone()
    }

    pub fn dead_flag(&self) -> Flag {
        self.dead.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn is_dead(&self) -> bool {
        self.dead.get()
    }

    /// Raise `dead`. Returns `true` only for the first call; overriding
    /// `mark_dead` implementations use this as their once-guard.
    pub fn try_mark_dead(&self) -> bool {
        self.dead.raise()
    }

    /// Raise `destroyed` ahead of the drop, for owners whose own `Drop` needs
    /// observers to already see them as gone.
    pub(crate) fn mark_destroyed(&self) {
        self.destroyed.raise();
    }
}

impl Drop for MortalityFlags {
    fn drop(&mut self) {
        self.destroyed.raise();
    }
}

/// Capability: an entity observable from a distance.
pub trait HasMortality {
    fn mortality(&self) -> &MortalityFlags;

    /// Application-level end of life. Overrides must be idempotent (guard with
    /// `try_mark_dead`) and may release secondary bookkeeping.
    fn mark_dead(&self) {
        self.mortality().try_mark_dead();
    }
}

/// Non-owning handle that can mark its target dead if it is still around.
#[derive(Clone)]
pub struct MortalRef {
    target: Weak<dyn HasMortality>,
    destroyed: Flag,
    dead: Flag,
}

impl MortalRef {
    pub fn new<T: HasMortality + 'static>(target: &Rc<T>) -> Self {
        let flags = target.mortality();
        let destroyed = flags.destroyed_flag();
        let dead = flags.dead_flag();
        let target: Rc<dyn HasMortality> = target.clone();
        Self {
            target: Rc::downgrade(&target),
            destroyed,
            dead,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn is_dead(&self) -> bool {
        self.dead.get()
    }

    /// No-op once the target is destroyed or already dead.
    pub fn mark_dead(&self) {
        if self.destroyed.get() || self.dead.get() {
            return;
        }
        if let Some(target) = self.target.upgrade() {
            target.mark_dead();
        }
    }
}

impl fmt::Debug for MortalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MortalRef")
            .field("destroyed", &self.destroyed.get())
            .field("dead", &self.dead.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        flags: MortalityFlags,
        deaths: Cell<u32>,
    }

    impl Counter {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                flags: MortalityFlags::new(),
                deaths: Cell::new(0),
            })
        }
    }

    impl HasMortality for Counter {
        fn mortality(&self) -> &MortalityFlags {
            &self.flags
        }

        fn mark_dead(&self) {
            if self.flags.try_mark_dead() {
                self.deaths.set(self.deaths.get() + 1);
            }
        }
    }

    #[test]
    fn dropping_owner_raises_destroyed() {
        let c = Counter::new();
        let destroyed = c.mortality().destroyed_flag();
        let dead = c.mortality().dead_flag();

        assert!(!destroyed.get());
        drop(c);
        assert!(destroyed.get());
        // dead is independent
        assert!(!dead.get());
    }

    #[test]
    fn mortal_ref_marks_dead_once() {
        let c = Counter::new();
        let r = MortalRef::new(&c);

        r.mark_dead();
        r.mark_dead();
        c.mark_dead();

        assert!(r.is_dead());
        assert_eq!(c.deaths.get(), 1);
    }

    #[test]
    fn mortal_ref_is_inert_after_destruction() {
        let c = Counter::new();
        let r = MortalRef::new(&c);
        drop(c);

        assert!(r.is_destroyed());
        r.mark_dead();
        assert!(!r.is_dead());
    }

    #[test]
    fn try_mark_dead_reports_first_transition_only() {
        let flags = MortalityFlags::new();
        assert!(flags.try_mark_dead());
        assert!(!flags.try_mark_dead());
        assert!(flags.is_dead());
        assert!(!flags.is_destroyed());
    }
}
