//! joinery-core
//!
//! 継続ベースの非同期コードのための、小さなランタイム部品集です。
//! 並行性は「中断して、あとでイベントループから再開する」だけで、
//! すべて単一スレッド上で動きます。
//!
//! # モジュール構成
//! - **domain**: ID とソース位置
//! - **ports**: 外部コラボレータ（Scheduler, Diagnostics, IdGenerator）
//! - **impls**: ports の実装（ManualScheduler, TokioScheduler, ...）
//! - **mortal**: mortality フラグ、weak refcount、`WeakRef`
//! - **closure**: 継続フレームと CCEOC チェック
//! - **join**: `JoinGroup` / `Joiner`
//! - **event**: キャンセル可能なイベント
//! - **app**: `Runtime` とその組み立て
//! - **options** / **error**: 設定と違反の種類

pub mod app;
pub mod closure;
pub mod domain;
pub mod error;
pub mod event;
pub mod impls;
pub mod join;
pub mod mortal;
pub mod options;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::app::{Runtime, RuntimeBuilder, RuntimeStats};
pub use crate::closure::{Cceoc, Closure};
pub use crate::domain::{ClosureId, EventId, Location};
pub use crate::error::{OptionsError, Violation};
pub use crate::event::{Event, EventState};
pub use crate::join::{JoinGroup, Joiner};
pub use crate::options::{ErrorMode, Options};
