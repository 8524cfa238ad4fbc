use thiserror::Error;

use crate::domain::ClosureId;

/// Recoverable misuse detected at run time.
///
/// These are reported through `Runtime::report` with a location and never
/// returned as `Err`: the caller keeps running so that surrounding state
/// stays consistent. `Display` is the message handed to the diagnostics sink.
///
/// Count underflow is not in here; it panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("non-joined continuations leaked!")]
    LeakedJoin,

    #[error("join_group went out of scope")]
    StaleJoin,

    #[error("event triggered after it was cancelled")]
    TriggeredAfterCancel,

    #[error("event triggered after it was cleared")]
    TriggeredAfterClear,

    #[error("event triggered again while its action was running")]
    TriggeredWhileFiring,

    #[error("{0}: continuation exited without resuming or discarding its CCEOC")]
    CceocNotCalled(ClosureId),

    #[error("{0}: CCEOC called {1} times, expected exactly once")]
    CceocCalledTwice(ClosureId, u32),

    #[error("{0}: CCEOC handed out while another is still outstanding")]
    CceocAlreadyOutstanding(ClosureId),

    #[error("event leaked (never triggered)")]
    LeakedEvent,
}

impl Violation {
    /// Short machine-friendly name, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Violation::LeakedJoin => "leaked_join",
            Violation::StaleJoin => "stale_join",
            Violation::TriggeredAfterCancel => "triggered_after_cancel",
            Violation::TriggeredAfterClear => "triggered_after_clear",
            Violation::TriggeredWhileFiring => "triggered_while_firing",
            Violation::CceocNotCalled(_)
            | Violation::CceocCalledTwice(..)
            | Violation::CceocAlreadyOutstanding(_) => "cceoc",
            Violation::LeakedEvent => "leaked_event",
        }
    }
}

/// Configuration errors (see `Options::parse`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("unknown option flag {0:?} in {1:?}")]
    UnknownFlag(char, String),

    #[error("conflicting error modes {0:?} and {1:?}")]
    ConflictingModes(char, char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_reported_text() {
        assert_eq!(
            Violation::LeakedJoin.to_string(),
            "non-joined continuations leaked!"
        );
        assert_eq!(
            Violation::StaleJoin.to_string(),
            "join_group went out of scope"
        );
        assert!(
            Violation::CceocCalledTwice(ClosureId::new(3), 2)
                .to_string()
                .starts_with("closure-3:")
        );
    }

    #[test]
    fn cceoc_variants_share_a_kind() {
        assert_eq!(Violation::CceocNotCalled(ClosureId::new(1)).kind(), "cceoc");
        assert_eq!(
            Violation::CceocAlreadyOutstanding(ClosureId::new(1)).kind(),
            "cceoc"
        );
    }
}
