//! 発火時に何をするか（EventAction）

use crate::domain::Location;
use crate::join::Joiner;

/// Delivery action of an event.
pub trait EventAction<V> {
    /// Deliver `value`. Return `true` if the event should now be cleared;
    /// a reusable event normally returns `false` to stay armed.
    fn perform(&mut self, value: V, location: &Location, reuse: bool) -> bool;

    /// Release whatever the action holds. Called once the event is cleared.
    fn clear(&mut self) {}
}

/// Adapts a plain closure.
pub struct FnAction<F>(pub F);

impl<V, F: FnMut(V)> EventAction<V> for FnAction<F> {
    fn perform(&mut self, value: V, _location: &Location, reuse: bool) -> bool {
        (self.0)(value);
        !reuse
    }
}

/// Routes the value into a join group.
pub struct JoinAction<V> {
    joiner: Joiner<V>,
}

impl<V: 'static> JoinAction<V> {
    pub fn new(joiner: Joiner<V>) -> Self {
        Self { joiner }
    }
}

impl<V: 'static> EventAction<V> for JoinAction<V> {
    fn perform(&mut self, value: V, _location: &Location, reuse: bool) -> bool {
        self.joiner.join(value);
        !reuse
    }
}
