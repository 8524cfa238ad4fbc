//! Scheduler port - イベントループの抽象化
//!
//! このコアは I/O もタイマーも持ちません。「あとで実行してほしい」
//! 処理はすべてこの trait に渡します。
//!
//! # 実装
//! - **ManualScheduler**: 仮想時刻の実行キュー（テスト・組み込み用）
//! - **TokioScheduler**: `tokio::task::spawn_local` ベース

use std::time::Duration;

/// Zero-argument deferred action.
pub type Action = Box<dyn FnOnce() + 'static>;

/// Runs actions on a later turn of the event loop.
///
/// Implementations must never run `action` inside `schedule` itself: callers
/// rely on this to avoid reentrancy (finalize callbacks, join notifications,
/// joiner delivery).
pub trait Scheduler {
    fn schedule(&self, delay: Duration, action: Action);

    /// Shorthand for `schedule(Duration::ZERO, action)`.
    fn defer(&self, action: Action) {
        self.schedule(Duration::ZERO, action);
    }
}
