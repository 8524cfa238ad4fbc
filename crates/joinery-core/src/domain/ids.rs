//! Domain identifiers (strongly-typed serial IDs).
//!
//! # Phantom Type パターン
//! `Id<T>` というジェネリック型で共通実装を提供しつつ、
//! `T` はマーカー型としてコンパイル時の型安全性だけを提供します。
//! ClosureId と EventId は同じ u64 表現ですが、混同できません。
//!
//! ID は `Runtime` ごとの単調増加カウンタから払い出されます
//! (`ports::IdGenerator`)。診断メッセージの順序付けにだけ使い、
//! 正しさの根拠にはしません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"closure-", "event-"）を提供します。
pub trait IdMarker: 'static {
    fn prefix() -> &'static str;
}

/// Serial identifier, ordered by issue order.
#[repr(transparent)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }
}

// derive would put bounds on `T`; markers are uninhabited enums, so implement by hand.
impl<T: IdMarker> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IdMarker> Copy for Id<T> {}

impl<T: IdMarker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: IdMarker> Eq for Id<T> {}

impl<T: IdMarker> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdMarker> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: IdMarker> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdMarker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Closure のマーカー型
pub enum Closure {}

impl IdMarker for Closure {
    fn prefix() -> &'static str {
        "closure-"
    }
}

/// Event のマーカー型
pub enum Event {}

impl IdMarker for Event {
    fn prefix() -> &'static str {
        "event-"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of a suspended continuation frame.
pub type ClosureId = Id<Closure>;

/// Identifier of a cancellable event (leak reports, registry keys).
pub type EventId = Id<Event>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        assert_eq!(ClosureId::new(7).to_string(), "closure-7");
        assert_eq!(EventId::new(3).to_string(), "event-3");
    }

    #[test]
    fn ids_order_by_value() {
        let a = ClosureId::new(1);
        let b = ClosureId::new(2);
        assert!(a < b);
        assert_eq!(a, ClosureId::new(1));
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let id = ClosureId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");

        let back: ClosureId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<ClosureId>(), size_of::<u64>());
        assert_eq!(size_of::<EventId>(), size_of::<u64>());
    }
}
