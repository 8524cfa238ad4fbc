//! Joiner - グループを生かさずに結果を届ける
//!
//! Joiner はグループより長生きしえます。配送の時点でグループが既に
//! スコープ外なら、解放済みの状態には触れずに報告します。

use std::fmt;
use std::rc::Rc;

use super::group::{GroupCore, JoinGroup};
use crate::app::Runtime;
use crate::domain::Location;
use crate::error::Violation;
use crate::mortal::WeakRef;

struct JoinerInner<V> {
    group: WeakRef<GroupCore<V>>,
    location: Location,
    rt: Runtime,
}

pub struct Joiner<V> {
    inner: Rc<JoinerInner<V>>,
}

impl<V: 'static> Joiner<V> {
    pub(crate) fn new(group: &JoinGroup<V>, location: Location) -> Self {
        Self {
            inner: Rc::new(JoinerInner {
                group: group.weak_ref(),
                location,
                rt: group.runtime().clone(),
            }),
        }
    }

    pub fn location(&self) -> &Location {
        &self.inner.location
    }

    /// Whether the group is known to be gone already.
    pub fn is_stale(&self) -> bool {
        self.inner.group.pointer().is_none()
    }

    /// Deliver `value` on a later turn. The group is looked up again when
    /// the delivery runs.
    pub fn join(&self, value: V) {
        let inner = Rc::clone(&self.inner);
        self.inner.rt.defer(Box::new(move || {
            match inner.group.pointer() {
                Some(group) => {
                    tracing::trace!(location = %inner.location, "joiner delivered");
                    group.join(value);
                }
                None => inner.rt.report(&inner.location, Violation::StaleJoin),
            }
        }));
    }
}

impl<V: 'static> Clone for Joiner<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: 'static> fmt::Debug for Joiner<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Joiner")
            .field("location", &self.inner.location)
            .field("stale", &self.is_stale())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::testing::harness;

    #[test]
    fn delivery_is_deferred() {
        let (rt, sched, _diag) = harness(Options::default());
        let g = JoinGroup::<u32>::new(&rt, "g.rs:1");
        g.launch_one(None);
        let j = g.make_joiner("j.rs:1");

        j.join(4);
        assert_eq!(g.n_pending(), 0);
        assert_eq!(g.n_out(), 1);

        sched.run_until_idle();
        assert_eq!(g.pending(), Some(4));
    }

    #[test]
    fn joiner_does_not_keep_group_alive() {
        let (rt, _sched, _diag) = harness(Options::default());
        let g = JoinGroup::<u32>::new(&rt, "g.rs:1");
        let j = g.make_joiner("j.rs:1");
        assert!(!j.is_stale());

        drop(g);
        assert!(j.is_stale());
    }

    #[test]
    fn stale_delivery_is_reported() {
        let (rt, sched, diag) = harness(Options::default());
        let g = JoinGroup::<u32>::new(&rt, "g.rs:1");
        let j = g.make_joiner("j.rs:3");
        drop(g);

        j.join(1);
        sched.run_until_idle();

        let reports = diag.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].location, "j.rs:3");
        assert_eq!(reports[0].message, "join_group went out of scope");
    }

    #[test]
    fn group_dropped_between_join_and_delivery() {
        let (rt, sched, diag) = harness(Options::default());
        let g = JoinGroup::<u32>::new(&rt, "g.rs:1");
        g.launch_one(None);
        let j = g.make_joiner("j.rs:3");

        j.join(1);
        drop(g);
        sched.run_until_idle();

        assert_eq!(diag.matching("leaked").len(), 1);
        assert_eq!(diag.matching("out of scope").len(), 1);
    }
}
