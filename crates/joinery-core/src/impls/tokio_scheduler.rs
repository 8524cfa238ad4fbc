//! TokioScheduler - tokio の `LocalSet` 上で動く実行キュー

use std::time::Duration;

use crate::ports::{Action, Scheduler};

/// Runs actions as local tasks on the current tokio `LocalSet`.
///
/// Actions are `!Send` (the whole core is single-threaded), so `schedule`
/// must be called from inside `LocalSet::run_until` or a task spawned on one;
/// `spawn_local` panics otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, action: Action) {
        tokio::task::spawn_local(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            action();
        });
    }
}
