//! Runtime options.
//!
//! Behaviour on misuse is configured with a flag string, normally taken from
//! the `JOINERY_OPTIONS` environment variable:
//!
//! - `S`: strict mode (triggering a cancelled event is reported)
//! - `Q`: quiet, reports are dropped
//! - `A`: abort, panic after a report has been delivered
//!
//! Whitespace is ignored; flags are case-sensitive.

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

pub const OPTIONS_ENV: &str = "JOINERY_OPTIONS";

/// What happens after a `Violation` is detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Hand the report to the diagnostics sink and continue.
    #[default]
    Log,
    /// Drop the report.
    Silent,
    /// Hand the report to the sink, then panic.
    Fatal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub strict: bool,
    pub error_mode: ErrorMode,
}

impl Options {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Parse a flag string such as `"SA"`.
    pub fn parse(flags: &str) -> Result<Self, OptionsError> {
        let mut options = Self::default();
        let mut mode_flag: Option<char> = None;

        for c in flags.chars().filter(|c| !c.is_whitespace()) {
            let mode = match c {
                'S' => {
                    options.strict = true;
                    continue;
                }
                'Q' => ErrorMode::Silent,
                'A' => ErrorMode::Fatal,
                other => return Err(OptionsError::UnknownFlag(other, flags.to_string())),
            };
            if let Some(prev) = mode_flag
                && prev != c
            {
                return Err(OptionsError::ConflictingModes(prev, c));
            }
            mode_flag = Some(c);
            options.error_mode = mode;
        }

        Ok(options)
    }

    /// Read `JOINERY_OPTIONS`; an unset variable yields the defaults.
    pub fn from_env() -> Result<Self, OptionsError> {
        match std::env::var(OPTIONS_ENV) {
            Ok(flags) => Self::parse(&flags),
            Err(_) => Ok(Self::default()),
        }
    }
}
