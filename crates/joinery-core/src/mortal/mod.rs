//! Mortal - 寿命の追跡と弱参照
//!
//! # 構成
//! - **flags**: `MortalityFlags`, `HasMortality`, `MortalRef`
//! - **weak**: `WeakCount`, `WeakRefCounted`, `WeakRef`

pub mod flags;
pub mod weak;

pub use self::flags::{Flag, HasMortality, MortalRef, MortalityFlags};
pub use self::weak::{WeakCount, WeakRef, WeakRefCounted};
