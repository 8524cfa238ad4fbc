//! Location - 診断用のソース位置
//!
//! 報告は常に「どこで作られたか」を添えて行います。
//! 生成コードからは `"file:line"` 文字列、手書きのコードからは
//! `#[track_caller]` 経由の呼び出し位置を渡します。

use std::fmt;
use std::rc::Rc;

/// Free-form diagnostic location, usually `"file:line"`.
///
/// Cheap to clone; an unknown location renders as `(unknown)`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Location(Option<Rc<str>>);

impl Location {
    pub fn new(loc: impl AsRef<str>) -> Self {
        Self(Some(Rc::from(loc.as_ref())))
    }

    pub fn unknown() -> Self {
        Self(None)
    }

    /// Location of the caller, formatted as `file:line`.
    #[track_caller]
    pub fn caller() -> Self {
        let at = std::panic::Location::caller();
        Self::new(format!("{}:{}", at.file(), at.line()))
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or("(unknown)")
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Option<&str>> for Location {
    fn from(value: Option<&str>) -> Self {
        value.map(Self::new).unwrap_or_default()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location({})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_renders_placeholder() {
        assert_eq!(Location::unknown().to_string(), "(unknown)");
        assert_eq!(Location::from(None).to_string(), "(unknown)");
        assert!(!Location::default().is_known());
    }

    #[test]
    fn caller_points_at_this_file() {
        let loc = Location::caller();
        assert!(loc.is_known());
        assert!(loc.as_str().contains("location.rs:"));
    }
}
