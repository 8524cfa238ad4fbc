//! RuntimeBuilder - ランタイムの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - Scheduler は必須（これが無いと何も「あとで」実行できない）
//! - Diagnostics は省略時 `TracingDiagnostics`
//! - ID 生成器は省略時 `SerialIdGenerator`（1 から採番）

use std::rc::Rc;

use super::runtime::{Inner, Runtime};
use super::status::StatsCounters;
use crate::event::registry::EventRegistry;
use crate::impls::TracingDiagnostics;
use crate::options::Options;
use crate::ports::{Diagnostics, IdGenerator, Scheduler, SerialIdGenerator};

/// Builds a `Runtime`.
///
/// # 使用例
/// ```ignore
/// let rt = RuntimeBuilder::new()
///     .scheduler(Rc::new(ManualScheduler::new()))
///     .options(Options::from_env()?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    scheduler: Option<Rc<dyn Scheduler>>,
    diagnostics: Option<Rc<dyn Diagnostics>>,
    ids: Option<Box<dyn IdGenerator>>,
    options: Options,
}

/// BuildError はランタイム構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no scheduler configured; call RuntimeBuilder::scheduler before build")]
    MissingScheduler,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn diagnostics(mut self, diagnostics: Rc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Runtime, BuildError> {
        let scheduler = self.scheduler.ok_or(BuildError::MissingScheduler)?;
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Rc::new(TracingDiagnostics));
        let ids = self
            .ids
            .unwrap_or_else(|| Box::new(SerialIdGenerator::new()));

        Ok(Runtime::from_inner(Inner {
            scheduler,
            diagnostics,
            ids,
            options: std::cell::Cell::new(self.options),
            events: EventRegistry::default(),
            stats: StatsCounters::default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ManualScheduler;

    #[test]
    fn build_requires_scheduler() {
        let result = RuntimeBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingScheduler)));
    }

    #[test]
    fn build_with_defaults() {
        let rt = RuntimeBuilder::new()
            .scheduler(Rc::new(ManualScheduler::new()))
            .build()
            .unwrap();
        assert_eq!(rt.options(), Options::default());
        assert_eq!(rt.stats().closures_created, 0);
    }

    #[test]
    fn build_keeps_options() {
        let rt = RuntimeBuilder::new()
            .scheduler(Rc::new(ManualScheduler::new()))
            .options(Options::strict())
            .build()
            .unwrap();
        assert!(rt.is_strict());
    }
}
