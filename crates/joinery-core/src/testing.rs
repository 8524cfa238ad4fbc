//! Shared fixtures for unit tests.

use std::rc::Rc;

use crate::app::{Runtime, RuntimeBuilder};
use crate::impls::{ManualScheduler, RecordingDiagnostics};
use crate::options::Options;

/// Runtime wired to a manual scheduler and a recording sink.
pub(crate) fn harness(
    options: Options,
) -> (Runtime, Rc<ManualScheduler>, Rc<RecordingDiagnostics>) {
    let scheduler = Rc::new(ManualScheduler::new());
    let diagnostics = Rc::new(RecordingDiagnostics::new());
    let rt = RuntimeBuilder::new()
        .scheduler(scheduler.clone())
        .diagnostics(diagnostics.clone())
        .options(options)
        .build()
        .unwrap();
    (rt, scheduler, diagnostics)
}
