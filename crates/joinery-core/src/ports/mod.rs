//! Ports - 外部コラボレータへの抽象化レイヤー
//!
//! このコアが依存する外部要素は 3 つだけです。
//! - **Scheduler**: 「あとで実行」するイベントループ
//! - **Diagnostics**: エラー・リーク報告の送り先
//! - **IdGenerator**: Closure / Event の通し番号

pub mod diagnostics;
pub mod id_generator;
pub mod scheduler;

pub use self::diagnostics::Diagnostics;
pub use self::id_generator::{IdGenerator, SerialIdGenerator};
pub use self::scheduler::{Action, Scheduler};
