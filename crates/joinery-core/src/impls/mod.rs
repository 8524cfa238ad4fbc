//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **ManualScheduler**: 仮想時刻で動く決定的な実行キュー
//! - **TokioScheduler**: tokio の LocalSet 上で動く実行キュー
//! - **TracingDiagnostics**: `tracing` に流すデフォルトの報告先
//! - **RecordingDiagnostics**: メモリに貯める報告先（テスト用）

pub mod manual_scheduler;
pub mod recording_diagnostics;
pub mod tokio_scheduler;
pub mod tracing_diagnostics;

pub use self::manual_scheduler::ManualScheduler;
pub use self::recording_diagnostics::{Diagnostic, RecordingDiagnostics};
pub use self::tokio_scheduler::TokioScheduler;
pub use self::tracing_diagnostics::TracingDiagnostics;
