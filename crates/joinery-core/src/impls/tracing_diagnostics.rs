//! Diagnostics sink that writes through `tracing`.

use crate::ports::Diagnostics;

/// Default sink: every report becomes a `tracing::error!` event with the
/// location as a structured field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report_error(&self, location: &str, message: &str) {
        tracing::error!(target: "joinery", location, "{}", message);
    }
}
