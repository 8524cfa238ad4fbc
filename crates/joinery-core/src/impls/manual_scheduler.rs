//! ManualScheduler - 仮想時刻で動く決定的な実行キュー

use std::cell::{Cell, RefCell};
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::ports::{Action, Scheduler};

/// Scheduled action entry for the priority queue.
///
/// Ordered by `(due, seq)` reversed, so the BinaryHeap acts as a min-heap and
/// actions due at the same instant run in the order they were scheduled.
struct Scheduled {
    due: Duration,
    seq: u64,
    action: Action,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse ordering: earlier (due, seq) has higher priority
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// Run queue driven explicitly by the caller.
///
/// Time only moves when `advance` or `run_until_idle` is called. Actions may
/// schedule further actions while running; zero-delay ones run in the same
/// `run_ready` pass.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<BinaryHeap<Scheduled>>,
    now: Cell<Duration>,
    next_seq: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Pop the next action due at or before `now`. The borrow ends before the
    /// action runs, so actions are free to schedule more work.
    fn pop_due(&self) -> Option<Action> {
        let mut queue = self.queue.borrow_mut();
        let due = queue.peek().is_some_and(|e| e.due <= self.now.get());
        if due { queue.pop().map(|e| e.action) } else { None }
    }

    /// Run every action due now. Returns how many ran.
    pub fn run_ready(&self) -> usize {
        let mut ran = 0;
        while let Some(action) = self.pop_due() {
            action();
            ran += 1;
        }
        ran
    }

    /// Move virtual time forward by `by`, running everything that becomes due
    /// in order.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = self.run_ready();
        loop {
            let next_due = self.queue.borrow().peek().map(|e| e.due);
            match next_due {
                Some(due) if due <= target => {
                    self.now.set(due);
                    ran += self.run_ready();
                }
                _ => break,
            }
        }
        self.now.set(target);
        ran
    }

    /// Run until nothing is left, jumping virtual time as needed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = self.run_ready();
        loop {
            let next_due = self.queue.borrow().peek().map(|e| e.due);
            let Some(due) = next_due else {
                break;
            };
            if due > self.now.get() {
                self.now.set(due);
            }
            ran += self.run_ready();
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, action: Action) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.queue.borrow_mut().push(Scheduled {
            due: self.now.get() + delay,
            seq,
            action,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Action) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let make = move |name: &'static str| -> Action {
            let l = Rc::clone(&l);
            Box::new(move || l.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn schedule_never_runs_inline() {
        let sched = ManualScheduler::new();
        let (log, make) = recorder();

        sched.defer(make("a"));
        assert!(log.borrow().is_empty());
        assert_eq!(sched.len(), 1);

        assert_eq!(sched.run_ready(), 1);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn same_instant_runs_fifo() {
        let sched = ManualScheduler::new();
        let (log, make) = recorder();

        sched.defer(make("a"));
        sched.defer(make("b"));
        sched.defer(make("c"));
        sched.run_ready();

        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn delayed_actions_wait_for_time() {
        let sched = ManualScheduler::new();
        let (log, make) = recorder();

        sched.schedule(Duration::from_millis(20), make("late"));
        sched.schedule(Duration::from_millis(10), make("early"));
        sched.defer(make("now"));

        assert_eq!(sched.run_ready(), 1);
        assert_eq!(sched.advance(Duration::from_millis(15)), 1);
        assert_eq!(*log.borrow(), vec!["now", "early"]);

        assert_eq!(sched.run_until_idle(), 1);
        assert_eq!(*log.borrow(), vec!["now", "early", "late"]);
        assert_eq!(sched.now(), Duration::from_millis(20));
    }

    #[test]
    fn actions_can_schedule_more_work() {
        let sched = Rc::new(ManualScheduler::new());
        let (log, make) = recorder();

        let inner = make("inner");
        let s = Rc::clone(&sched);
        let l = Rc::clone(&log);
        sched.defer(Box::new(move || {
            l.borrow_mut().push("outer");
            s.defer(inner);
        }));

        assert_eq!(sched.run_until_idle(), 2);
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
        assert!(sched.is_empty());
    }
}
