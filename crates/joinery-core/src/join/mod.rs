//! Join - ファンアウト／ファンインの同期
//!
//! `JoinGroup` は未完了の呼び出し数と届いた結果のキューを持ちます。
//! `Joiner` はグループを弱参照で持ち、結果を scheduler 経由で届けます。

mod group;
mod joiner;

pub use self::group::JoinGroup;
pub use self::joiner::Joiner;

pub(crate) use self::group::GroupCore;
