//! Diagnostics sink that keeps every report in memory.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::ports::Diagnostics;

/// One delivered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub location: String,
    pub message: String,
}

/// Collects reports for later inspection (tests, shutdown dumps).
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    reports: RefCell<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    pub fn reports(&self) -> Vec<Diagnostic> {
        self.reports.borrow().clone()
    }

    /// Reports whose message contains `needle`.
    pub fn matching(&self, needle: &str) -> Vec<Diagnostic> {
        self.reports
            .borrow()
            .iter()
            .filter(|d| d.message.contains(needle))
            .cloned()
            .collect()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.reports.borrow_mut())
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report_error(&self, location: &str, message: &str) {
        self.reports.borrow_mut().push(Diagnostic {
            location: location.to_string(),
            message: message.to_string(),
        });
    }
}
