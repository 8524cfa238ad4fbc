//! イベントの状態遷移

use std::fmt;

use serde::{Deserialize, Serialize};

/// Event state.
///
/// State transitions:
/// - Pending -> Cleared   (fired, or `finish`)
/// - Pending -> Cancelled (`cancel`)
/// - Cleared -> Pending   (only through `reuse` re-arming, or `reinit`)
///
/// `Cancelled` and `Cleared` are otherwise final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    Pending,
    Cancelled,
    Cleared,
}

impl EventState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EventState::Cancelled | EventState::Cleared)
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventState::Pending => "pending",
            EventState::Cancelled => "cancelled",
            EventState::Cleared => "cleared",
        };
        f.write_str(s)
    }
}
