//! Event - キャンセル可能なイベント
//!
//! Closure が待つ単位です。非同期操作ごとに作られ、操作を完了させた側が
//! 一度だけ発火させます（タイマーやシャットダウンでキャンセルされることも
//! あります）。発火すると `EventAction` が実行されます。
//!
//! ```text
//!            trigger / finish
//!  Pending ───────────────────▶ Cleared
//!     │  ▲                          │
//!     │  └──── reuse re-arms ───────┘
//!     │ cancel
//!     ▼
//!  Cancelled
//! ```

mod action;
pub(crate) mod registry;
mod state;

pub use self::action::{EventAction, FnAction, JoinAction};
pub use self::registry::{EventStatus, report_leaks};
pub use self::state::EventState;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::app::Runtime;
use crate::app::status::bump;
use crate::domain::{EventId, Location};
use crate::error::Violation;

struct EventCore<V> {
    id: EventId,
    rt: Runtime,
    location: RefCell<Location>,
    state: Cell<EventState>,
    reuse: Cell<bool>,
    cancel_notifier: RefCell<Option<Event<()>>>,
    /// slot values assigned ahead of `trigger_no_assign`
    staged: RefCell<Option<V>>,
    action: RefCell<Option<Box<dyn EventAction<V>>>>,
}

impl<V> EventStatus for EventCore<V> {
    fn id(&self) -> EventId {
        self.id
    }

    fn location(&self) -> Location {
        self.location.borrow().clone()
    }

    fn state(&self) -> EventState {
        self.state.get()
    }
}

impl<V> Drop for EventCore<V> {
    fn drop(&mut self) {
        self.rt.events().unregister(self.id);
    }
}

/// Handle to a cancellable event. Clones refer to the same event.
pub struct Event<V> {
    core: Rc<EventCore<V>>,
}

impl<V: 'static> Event<V> {
    pub fn new(rt: &Runtime, location: impl Into<Location>, action: impl EventAction<V> + 'static) -> Self {
        let core = Rc::new(EventCore {
            id: rt.next_event_id(),
            rt: rt.clone(),
            location: RefCell::new(location.into()),
            state: Cell::new(EventState::Pending),
            reuse: Cell::new(false),
            cancel_notifier: RefCell::new(None),
            staged: RefCell::new(None),
            action: RefCell::new(Some(Box::new(action))),
        });
        let status: Rc<dyn EventStatus> = core.clone();
        rt.events().register(core.id, Rc::downgrade(&status));
        Self { core }
    }

    /// Event whose delivery is a plain closure.
    pub fn from_fn(rt: &Runtime, location: impl Into<Location>, f: impl FnMut(V) + 'static) -> Self {
        Self::new(rt, location, FnAction(f))
    }

    pub fn id(&self) -> EventId {
        self.core.id
    }

    pub fn location(&self) -> Location {
        self.core.location.borrow().clone()
    }

    pub fn state(&self) -> EventState {
        self.core.state.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == EventState::Cancelled
    }

    pub fn set_reuse(&self, reuse: bool) {
        self.core.reuse.set(reuse);
    }

    pub fn reuse(&self) -> bool {
        self.core.reuse.get()
    }

    /// Triggered (once) when this event is cancelled.
    pub fn set_cancel_notifier(&self, notifier: Event<()>) {
        *self.core.cancel_notifier.borrow_mut() = Some(notifier);
    }

    /// Reset a finished event for another round, e.g. from a pool.
    pub fn reinit(&self, location: impl Into<Location>, action: impl EventAction<V> + 'static) {
        *self.core.location.borrow_mut() = location.into();
        self.core.state.set(EventState::Pending);
        self.core.reuse.set(false);
        self.core.staged.borrow_mut().take();
        *self.core.action.borrow_mut() = Some(Box::new(action));
    }

    /// Pending -> Cancelled, and fire the cancel notifier. Idempotent; a
    /// cleared event stays cleared.
    pub fn cancel(&self) {
        if self.core.state.get() != EventState::Pending {
            return;
        }
        self.core.state.set(EventState::Cancelled);
        bump(&self.core.rt.counters().events_cancelled);

        let notifier = self.core.cancel_notifier.borrow_mut().take();
        if let Some(notifier) = notifier {
            notifier.trigger(());
        }
    }

    /// Whether firing now is legal. Misfires are reported:
    /// after `cancel` only in strict mode (it may be a benign race),
    /// after clearing always (a continuation would resume twice).
    pub fn can_trigger(&self) -> bool {
        match self.core.state.get() {
            EventState::Pending => true,
            EventState::Cancelled => {
                if self.core.rt.is_strict() {
                    self.core
                        .rt
                        .report(&self.location(), Violation::TriggeredAfterCancel);
                }
                false
            }
            EventState::Cleared => {
                self.core
                    .rt
                    .report(&self.location(), Violation::TriggeredAfterClear);
                false
            }
        }
    }

    /// Assign slot values without firing.
    pub fn set(&self, value: V) {
        *self.core.staged.borrow_mut() = Some(value);
    }

    /// Fire with `value`. Returns whether the action ran.
    pub fn trigger(&self, value: V) -> bool {
        if !self.can_trigger() {
            return false;
        }
        self.core.staged.borrow_mut().take();
        self.perform(value)
    }

    fn perform(&self, value: V) -> bool {
        let location = self.location();
        let reuse = self.core.reuse.get();

        // Taken out for the call so the action may touch this event again.
        // An empty slot while Pending means we are inside our own action.
        let action = self.core.action.borrow_mut().take();
        let Some(mut action) = action else {
            self.core.rt.report(&location, Violation::TriggeredWhileFiring);
            return false;
        };
        bump(&self.core.rt.counters().events_triggered);

        // a one-shot event is spent as soon as delivery starts
        if !reuse {
            self.core.state.set(EventState::Cleared);
        }

        let clear = action.perform(value, &location, reuse);
        if clear {
            if self.core.state.get() == EventState::Pending {
                self.core.state.set(EventState::Cleared);
            }
            action.clear();
        } else {
            let mut slot = self.core.action.borrow_mut();
            if slot.is_none() {
                *slot = Some(action);
                if !reuse && self.core.state.get() == EventState::Cleared {
                    self.core.state.set(EventState::Pending);
                }
            }
        }
        true
    }

    /// Explicitly clear the event, whether or not it fired.
    pub fn finish(&self) {
        if self.core.state.get() == EventState::Pending {
            self.core.state.set(EventState::Cleared);
        }
        self.core.staged.borrow_mut().take();
        let action = self.core.action.borrow_mut().take();
        if let Some(mut action) = action {
            action.clear();
        }
    }
}

impl<V: Default + 'static> Event<V> {
    /// Fire with the values already assigned through `set`; slots never
    /// assigned are defaulted. Returns whether the action ran.
    pub fn trigger_no_assign(&self) -> bool {
        if !self.can_trigger() {
            return false;
        }
        let value = self.core.staged.borrow_mut().take().unwrap_or_default();
        self.perform(value)
    }
}

impl<V> Clone for Event<V> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<V> EventStatus for Event<V> {
    fn id(&self) -> EventId {
        self.core.id
    }

    fn location(&self) -> Location {
        self.core.location.borrow().clone()
    }

    fn state(&self) -> EventState {
        self.core.state.get()
    }
}

impl<V> fmt::Debug for Event<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.core.id)
            .field("location", &*self.core.location.borrow())
            .field("state", &self.core.state.get())
            .field("reuse", &self.core.reuse.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::JoinGroup;
    use crate::options::Options;
    use crate::testing::harness;
    use rstest::rstest;

    fn counting_event(rt: &Runtime) -> (Event<u32>, Rc<RefCell<Vec<u32>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let ev = Event::from_fn(rt, "ev.rs:1", move |v| s.borrow_mut().push(v));
        (ev, seen)
    }

    #[test]
    fn fires_once_then_clears() {
        let (rt, _sched, diag) = harness(Options::default());
        let (ev, seen) = counting_event(&rt);

        assert!(ev.trigger(5));
        assert_eq!(ev.state(), EventState::Cleared);
        assert_eq!(*seen.borrow(), vec![5]);
        assert!(diag.is_empty());
    }

    #[rstest]
    #[case::lenient(false)]
    #[case::strict(true)]
    fn second_trigger_is_always_reported(#[case] strict: bool) {
        let (rt, _sched, diag) = harness(Options { strict, ..Options::default() });
        let (ev, seen) = counting_event(&rt);

        ev.trigger(1);
        assert!(!ev.trigger(2));

        assert_eq!(*seen.borrow(), vec![1]);
        let reports = diag.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].message, "event triggered after it was cleared");
        assert_eq!(reports[0].location, "ev.rs:1");
    }

    #[rstest]
    #[case::lenient(false, 0)]
    #[case::strict(true, 1)]
    fn trigger_after_cancel_depends_on_mode(#[case] strict: bool, #[case] expected: usize) {
        let (rt, _sched, diag) = harness(Options { strict, ..Options::default() });
        let (ev, seen) = counting_event(&rt);

        ev.cancel();
        assert!(!ev.trigger(1));

        assert!(seen.borrow().is_empty());
        assert_eq!(diag.matching("cancelled").len(), expected);
        assert_eq!(ev.state(), EventState::Cancelled);
    }

    #[test]
    fn cancel_is_idempotent_and_notifies_once() {
        let (rt, _sched, _diag) = harness(Options::default());
        let (ev, _seen) = counting_event(&rt);
        let notified = Rc::new(Cell::new(0));
        let n = Rc::clone(&notified);
        ev.set_cancel_notifier(Event::from_fn(&rt, "cancel.rs:1", move |()| n.set(n.get() + 1)));

        ev.cancel();
        ev.cancel();

        assert_eq!(notified.get(), 1);
        assert_eq!(rt.stats().events_cancelled, 1);
    }

    #[test]
    fn cancel_after_clear_is_ignored() {
        let (rt, _sched, _diag) = harness(Options::default());
        let (ev, _seen) = counting_event(&rt);
        ev.trigger(1);
        ev.cancel();
        assert_eq!(ev.state(), EventState::Cleared);
    }

    #[test]
    fn reusable_event_stays_armed() {
        let (rt, _sched, diag) = harness(Options::default());
        let (ev, seen) = counting_event(&rt);
        ev.set_reuse(true);

        ev.trigger(1);
        ev.trigger(2);
        assert_eq!(ev.state(), EventState::Pending);

        ev.set_reuse(false);
        ev.trigger(3);
        assert_eq!(ev.state(), EventState::Cleared);

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert!(diag.is_empty());
    }

    #[test]
    fn trigger_no_assign_uses_staged_or_default_values() {
        let (rt, _sched, _diag) = harness(Options::default());
        let (ev, seen) = counting_event(&rt);
        ev.set_reuse(true);

        ev.set(8);
        ev.trigger_no_assign();
        ev.trigger_no_assign();

        assert_eq!(*seen.borrow(), vec![8, 0]);
    }

    #[test]
    fn finish_clears_without_firing() {
        let (rt, _sched, diag) = harness(Options::default());
        let (ev, seen) = counting_event(&rt);

        ev.finish();
        assert_eq!(ev.state(), EventState::Cleared);
        assert!(!ev.trigger(1));
        assert!(seen.borrow().is_empty());
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn reinit_rearms_a_finished_event() {
        let (rt, _sched, diag) = harness(Options::default());
        let (ev, seen) = counting_event(&rt);
        ev.trigger(1);

        let s = Rc::clone(&seen);
        ev.reinit("ev.rs:2", FnAction(move |v: u32| s.borrow_mut().push(v * 10)));
        assert_eq!(ev.location().as_str(), "ev.rs:2");
        ev.trigger(2);

        assert_eq!(*seen.borrow(), vec![1, 20]);
        assert!(diag.is_empty());
    }

    #[test]
    fn join_events_route_values_into_their_group() {
        let (rt, sched, diag) = harness(Options::default());
        let g = JoinGroup::<(u32, bool)>::new(&rt, "g.rs:1");
        let a = g.make_event(None, "a.rs:1");
        let b = g.make_event(None, "b.rs:1");
        assert_eq!(g.n_out(), 2);

        b.trigger((2, false));
        a.trigger((1, true));
        sched.run_until_idle();

        assert_eq!(g.pending(), Some((2, false)));
        assert_eq!(g.pending(), Some((1, true)));
        assert!(!g.need_join());
        assert!(diag.is_empty());
    }

    #[test]
    fn cancelled_join_event_needs_remove_join() {
        let (rt, _sched, diag) = harness(Options::default());
        let g = JoinGroup::<u32>::new(&rt, "g.rs:1");
        let ev = g.make_event(None, "a.rs:1");

        ev.cancel();
        g.remove_join();
        drop(g);

        assert!(diag.is_empty());
    }

    #[test]
    fn leak_report_lists_pending_events_only() {
        let (rt, _sched, diag) = harness(Options::default());
        let fired = Event::from_fn(&rt, "fired.rs:1", |_: ()| {});
        let cancelled = Event::from_fn(&rt, "cancelled.rs:1", |_: ()| {});
        let waiting = Event::from_fn(&rt, "waiting.rs:1", |_: ()| {});
        let dropped = Event::from_fn(&rt, "dropped.rs:1", |_: ()| {});
        fired.trigger(());
        cancelled.cancel();
        drop(dropped);

        assert_eq!(rt.live_events(), 3);
        assert_eq!(rt.report_event_leaks(), 1);
        let reports = diag.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].location, "waiting.rs:1");

        let explicit = [&fired as &dyn EventStatus, &cancelled, &waiting];
        assert_eq!(report_leaks(&rt, explicit), 1);
    }

    #[test]
    fn dropped_events_leave_the_registry() {
        let (rt, _sched, _diag) = harness(Options::default());
        let keep = Event::from_fn(&rt, "keep.rs:1", |_: u32| {});
        for i in 0..10_000u32 {
            let ev = Event::from_fn(&rt, "loop.rs:1", |_: u32| {});
            if i % 2 == 0 {
                ev.trigger(i);
            }
        }

        assert_eq!(rt.events().len(), 1);
        assert_eq!(rt.live_events(), 1);
        drop(keep);
        assert_eq!(rt.events().len(), 0);
        assert_eq!(rt.stats().events_created, 10_001);
    }

    /// Event whose action fires the same event once more from inside.
    fn self_triggering(rt: &Runtime, reuse: bool) -> (Event<u32>, Rc<RefCell<Vec<u32>>>, Rc<Cell<Option<bool>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let nested = Rc::new(Cell::new(None));
        let me: Rc<RefCell<Option<Event<u32>>>> = Rc::new(RefCell::new(None));

        let (s, n, m) = (Rc::clone(&seen), Rc::clone(&nested), Rc::clone(&me));
        let ev = Event::from_fn(rt, "again.rs:1", move |v: u32| {
            s.borrow_mut().push(v);
            let this = m.borrow_mut().take();
            if let Some(this) = this {
                n.set(Some(this.trigger(v + 1)));
            }
        });
        ev.set_reuse(reuse);
        *me.borrow_mut() = Some(ev.clone());
        (ev, seen, nested)
    }

    #[rstest]
    #[case::lenient(Options::default())]
    #[case::strict(Options::strict())]
    fn one_shot_triggered_from_its_own_action_is_reported(#[case] options: Options) {
        let (rt, _sched, diag) = harness(options);
        let (ev, seen, nested) = self_triggering(&rt, false);

        assert!(ev.trigger(1));

        assert_eq!(nested.get(), Some(false));
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(ev.state(), EventState::Cleared);
        let reports = diag.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].message, "event triggered after it was cleared");
        assert_eq!(rt.stats().events_triggered, 1);
    }

    #[test]
    fn reusable_event_triggered_from_its_own_action_is_reported() {
        let (rt, _sched, diag) = harness(Options::default());
        let (ev, seen, nested) = self_triggering(&rt, true);

        assert!(ev.trigger(1));

        assert_eq!(nested.get(), Some(false));
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(ev.state(), EventState::Pending);
        assert_eq!(diag.matching("while its action was running").len(), 1);
        assert_eq!(rt.stats().events_triggered, 1);

        // still armed afterwards
        assert!(ev.trigger(5));
        assert_eq!(*seen.borrow(), vec![1, 5]);
    }

    #[test]
    fn event_ids_and_stats() {
        let (rt, _sched, _diag) = harness(Options::default());
        let (a, _) = counting_event(&rt);
        let (b, _) = counting_event(&rt);
        assert!(a.id() < b.id());

        a.trigger(1);
        let stats = rt.stats();
        assert_eq!(stats.events_created, 2);
        assert_eq!(stats.events_triggered, 1);
    }
}
