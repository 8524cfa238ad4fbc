//! JoinGroup 本体
//!
//! 未完了の呼び出しがいくつあるか、届いたがまだ取り出されていない結果、
//! そして誰が起こされるのを待っているかを管理します。

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use super::joiner::Joiner;
use crate::app::Runtime;
use crate::app::status::bump;
use crate::closure::{Closure, GroupSite};
use crate::domain::{ClosureId, Location};
use crate::error::Violation;
use crate::event::{Event, JoinAction};
use crate::mortal::{HasMortality, MortalRef, MortalityFlags, WeakRef};
use crate::ports::Action;

/// Shared state behind every `JoinGroup` handle.
pub(crate) struct GroupCore<V> {
    rt: Runtime,
    location: Location,
    flags: MortalityFlags,

    /// calls out that have not completed yet
    n_out: Cell<usize>,

    /// completed calls waiting to be consumed, oldest first
    pending: RefCell<VecDeque<V>>,

    /// waiter wake-up, fired at most once per registration
    notify: RefCell<Option<Action>>,

    /// Closures registered by launch_one, deduplicated by id. We weakly
    /// unregister from them when we die so they can detect closure leaks.
    closure_ids: RefCell<HashSet<ClosureId>>,
    closures: RefCell<Vec<WeakRef<Closure>>>,
}

impl<V> GroupCore<V> {
    pub(crate) fn n_out(&self) -> usize {
        self.n_out.get()
    }

    pub(crate) fn n_pending(&self) -> usize {
        self.pending.borrow().len()
    }

    pub(crate) fn n_joins_left(&self) -> usize {
        self.n_out() + self.n_pending()
    }

    pub(crate) fn join(&self, value: V) {
        let out = self.n_out.get();
        assert!(out > 0, "join with no outstanding calls ({})", self.location);
        self.n_out.set(out - 1);
        self.pending.borrow_mut().push_back(value);
        bump(&self.rt.counters().joins_delivered);

        let waiter = self.notify.borrow_mut().take();
        if let Some(waiter) = waiter {
            self.rt.defer(waiter);
        }
    }
}

impl<V> HasMortality for GroupCore<V> {
    fn mortality(&self) -> &MortalityFlags {
        &self.flags
    }

    fn mark_dead(&self) {
        if !self.flags.try_mark_dead() {
            return;
        }

        let left = self.n_joins_left();
        tracing::debug!(location = %self.location, left, "join group marked dead");
        if left > 0 {
            self.rt.report(&self.location, Violation::LeakedJoin);
        }

        // unregister all closures by weakly decref'ing them
        let closures = std::mem::take(&mut *self.closures.borrow_mut());
        for closure in &closures {
            closure.weak_decref();
        }
    }
}

impl<V> Drop for GroupCore<V> {
    fn drop(&mut self) {
        self.mark_dead();
    }
}

/// Fan-out/fan-in synchronizer.
///
/// A cheap cloneable handle; the group is destroyed when the last handle
/// (including a frame arena's) goes away, and at that point any unresolved
/// work is reported as a leak.
///
/// Invariant: `n_joins_left() == n_out() + n_pending()`.
pub struct JoinGroup<V> {
    core: Rc<GroupCore<V>>,
    site: GroupSite,
}

impl<V: 'static> JoinGroup<V> {
    pub fn new(rt: &Runtime, location: impl Into<Location>) -> Self {
        let core = Rc::new(GroupCore {
            rt: rt.clone(),
            location: location.into(),
            flags: MortalityFlags::new(),
            n_out: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            notify: RefCell::new(None),
            closure_ids: RefCell::new(HashSet::new()),
            closures: RefCell::new(Vec::new()),
        });
        Self {
            core,
            site: GroupSite::Detached,
        }
    }

    pub(crate) fn with_site(mut self, site: GroupSite) -> Self {
        self.site = site;
        self
    }

    pub(crate) fn mortal(&self) -> Rc<dyn HasMortality> {
        self.core.clone()
    }

    pub(crate) fn weak_ref(&self) -> WeakRef<GroupCore<V>> {
        WeakRef::new(&self.core)
    }

    pub fn site(&self) -> GroupSite {
        self.site
    }

    pub fn location(&self) -> &Location {
        &self.core.location
    }

    pub fn runtime(&self) -> &Runtime {
        &self.core.rt
    }

    /// One more call is out. A closure, if given, is registered once (by id)
    /// and linked back to this group.
    pub fn launch_one(&self, closure: Option<&Rc<Closure>>) {
        if let Some(closure) = closure {
            self.associate_closure(closure);
        }
        self.add_join();
    }

    fn associate_closure(&self, closure: &Rc<Closure>) {
        if !self.core.closure_ids.borrow_mut().insert(closure.id()) {
            return;
        }
        let weak = WeakRef::new(closure);
        weak.weak_incref();
        self.core.closures.borrow_mut().push(weak);

        closure.associate_join_group(MortalRef::new(&self.core), self.site);
    }

    /// Register another outstanding call, e.g. for a sticky callback that
    /// fires more than once.
    pub fn add_join(&self) {
        self.core.n_out.set(self.core.n_out.get() + 1);
    }

    /// Unregister a call that was cancelled before it fired.
    ///
    /// Panics if nothing is outstanding.
    pub fn remove_join(&self) {
        let out = self.core.n_out.get();
        assert!(out > 0, "remove_join with no outstanding calls ({})", self.core.location);
        self.core.n_out.set(out - 1);
    }

    /// A call completed with `value`. A registered waiter is scheduled, not
    /// called.
    pub fn join(&self, value: V) {
        self.core.join(value);
    }

    /// Oldest completed result not yet consumed.
    pub fn pending(&self) -> Option<V> {
        self.core.pending.borrow_mut().pop_front()
    }

    pub fn n_pending(&self) -> usize {
        self.core.n_pending()
    }

    pub fn n_out(&self) -> usize {
        self.core.n_out()
    }

    pub fn n_joins_left(&self) -> usize {
        self.core.n_joins_left()
    }

    pub fn need_join(&self) -> bool {
        self.n_joins_left() > 0
    }

    /// Register the waiter to wake on the next `join`.
    pub fn set_notify(&self, action: Action) {
        *self.core.notify.borrow_mut() = Some(action);
    }

    pub fn has_notify(&self) -> bool {
        self.core.notify.borrow().is_some()
    }

    pub fn clear_notify(&self) {
        self.core.notify.borrow_mut().take();
    }

    /// Force the group out of scope. Idempotent.
    pub fn mark_dead(&self) {
        self.core.mark_dead();
    }

    pub fn is_dead(&self) -> bool {
        self.core.flags.is_dead()
    }

    pub fn make_joiner(&self, location: impl Into<Location>) -> Joiner<V> {
        Joiner::new(self, location.into())
    }

    /// Launch one call and return the event that completes it: triggering
    /// the event delivers its value into this group through a joiner.
    pub fn make_event(&self, closure: Option<&Rc<Closure>>, location: impl Into<Location>) -> Event<V> {
        let location = location.into();
        self.launch_one(closure);
        let joiner = self.make_joiner(location.clone());
        Event::new(&self.core.rt, location, JoinAction::new(joiner))
    }
}

impl<V: 'static> Clone for JoinGroup<V> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            site: self.site,
        }
    }
}

impl<V: 'static> fmt::Debug for JoinGroup<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinGroup")
            .field("location", &self.core.location)
            .field("n_out", &self.n_out())
            .field("n_pending", &self.n_pending())
            .field("dead", &self.is_dead())
            .field("site", &self.site)
            .finish()
    }
}
