//! App - ランタイムの組み立て
//!
//! # 主要コンポーネント
//! - **RuntimeBuilder**: ports を組み合わせて Runtime を構築
//! - **Runtime**: Closure / JoinGroup / Event が共有するコンテキスト
//! - **RuntimeStats**: 統計のスナップショット

pub mod builder;
pub mod runtime;
pub mod status;

pub use self::builder::{BuildError, RuntimeBuilder};
pub use self::runtime::Runtime;
pub use self::status::RuntimeStats;
