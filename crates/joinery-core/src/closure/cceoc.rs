//! CCEOC（Call-Exactly-Once Checked Continuation）
//!
//! `Cceoc` は線形な再開ハンドルです。所有フレームのスコープ終了チェックより
//! 前に `resume` か `discard` で消費されなければなりません。状態は
//! フレームと共有され、スコープ終了時に検査されます。
//!
//! # 状態遷移
//! - Unused -> Consumed   (`resume`)
//! - Unused -> Discarded  (`discard`、この経路では再開しない)
//!
//! ハンドルを drop すると `Unused` のまま残り、チェックで報告されます。

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use super::Closure;
use crate::domain::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CceocState {
    Unused,
    Consumed,
    Discarded,
}

impl CceocState {
    pub fn is_settled(self) -> bool {
        !matches!(self, CceocState::Unused)
    }
}

/// Resume handle handed out by `Closure::cceoc`.
#[must_use = "a CCEOC must be resumed or discarded"]
pub struct Cceoc<A> {
    state: Rc<Cell<CceocState>>,
    frame: Weak<Closure>,
    location: Location,
    callback: Box<dyn FnOnce(A)>,
}

impl<A> Cceoc<A> {
    pub(crate) fn new(
        state: Rc<Cell<CceocState>>,
        frame: Weak<Closure>,
        location: Location,
        callback: Box<dyn FnOnce(A)>,
    ) -> Self {
        Self {
            state,
            frame,
            location,
            callback,
        }
    }

    pub fn state(&self) -> CceocState {
        self.state.get()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Unblock the caller. The activation is counted on the frame (if it is
    /// still alive) before the callback runs.
    pub fn resume(self, args: A) {
        self.state.set(CceocState::Consumed);
        if let Some(frame) = self.frame.upgrade() {
            frame.record_cceoc();
        }
        (self.callback)(args);
    }

    /// Explicitly decline to resume on this path.
    pub fn discard(self) {
        self.state.set(CceocState::Discarded);
    }
}

impl<A> fmt::Debug for Cceoc<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cceoc")
            .field("state", &self.state.get())
            .field("location", &self.location)
            .finish()
    }
}
