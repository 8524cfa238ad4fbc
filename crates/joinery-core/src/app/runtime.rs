//! Runtime - 共有コンテキスト
//!
//! Scheduler・Diagnostics・Options・ID カウンタ・イベント登録簿を束ねる
//! ハンドルです。Closure / JoinGroup / Event はすべてこれを保持します。
//! `Rc` の clone なので安価に複製できます（シングルスレッド前提）。

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::status::{RuntimeStats, StatsCounters, bump};
use crate::domain::{ClosureId, EventId, Location};
use crate::error::Violation;
use crate::event::registry::EventRegistry;
use crate::options::{ErrorMode, Options};
use crate::ports::{Action, Diagnostics, IdGenerator, Scheduler};

pub(crate) struct Inner {
    pub(crate) scheduler: Rc<dyn Scheduler>,
    pub(crate) diagnostics: Rc<dyn Diagnostics>,
    pub(crate) ids: Box<dyn IdGenerator>,
    pub(crate) options: Cell<Options>,
    pub(crate) events: EventRegistry,
    pub(crate) stats: StatsCounters,
}

/// Shared context for closures, join groups and events.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<Inner>,
}

impl Runtime {
    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Rc::new(inner),
        }
    }

    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.inner.scheduler
    }

    pub fn diagnostics(&self) -> &Rc<dyn Diagnostics> {
        &self.inner.diagnostics
    }

    pub fn options(&self) -> Options {
        self.inner.options.get()
    }

    /// Options may be changed at run time; later checks see the new values.
    pub fn set_options(&self, options: Options) {
        self.inner.options.set(options);
    }

    pub fn is_strict(&self) -> bool {
        self.inner.options.get().strict
    }

    pub fn schedule(&self, delay: Duration, action: Action) {
        self.inner.scheduler.schedule(delay, action);
    }

    pub fn defer(&self, action: Action) {
        self.inner.scheduler.schedule(Duration::ZERO, action);
    }

    /// Single reporting path for every `Violation`.
    ///
    /// `ErrorMode::Fatal` panics after the sink has seen the report.
    pub fn report(&self, location: &Location, violation: Violation) {
        bump(&self.inner.stats.violations);
        let message = violation.to_string();
        match self.inner.options.get().error_mode {
            ErrorMode::Silent => {
                tracing::trace!(location = %location, kind = violation.kind(), "suppressed: {message}");
            }
            ErrorMode::Log => {
                self.inner
                    .diagnostics
                    .report_error(location.as_str(), &message);
            }
            ErrorMode::Fatal => {
                self.inner
                    .diagnostics
                    .report_error(location.as_str(), &message);
                panic!("{location}: {message}");
            }
        }
    }

    pub fn stats(&self) -> RuntimeStats {
        self.inner.stats.snapshot()
    }

    /// Report every live event that is still pending. Returns how many were
    /// reported.
    pub fn report_event_leaks(&self) -> usize {
        let live = self.inner.events.live();
        crate::event::report_leaks(self, live.iter().map(Rc::as_ref))
    }

    /// Number of events created through this runtime and still alive.
    pub fn live_events(&self) -> usize {
        self.inner.events.live().len()
    }

    pub(crate) fn next_closure_id(&self) -> ClosureId {
        bump(&self.inner.stats.closures_created);
        self.inner.ids.next_closure_id()
    }

    pub(crate) fn next_event_id(&self) -> EventId {
        bump(&self.inner.stats.events_created);
        self.inner.ids.next_event_id()
    }

    pub(crate) fn events(&self) -> &EventRegistry {
        &self.inner.events
    }

    pub(crate) fn counters(&self) -> &StatsCounters {
        &self.inner.stats
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.inner.options.get())
            .field("stats", &self.inner.stats.snapshot())
            .finish()
    }
}
