//! Diagnostics port - 診断レポートの送り先
//!
//! リーク・二重トリガ・CCEOC 違反などはここに報告されます。
//! 報告は助言的なもので、呼び出し側は処理を継続します。

/// Sink for diagnostic reports.
///
/// `location` is free-form (usually `file:line`, or `(unknown)`),
/// `message` is human readable.
pub trait Diagnostics {
    fn report_error(&self, location: &str, message: &str);
}
