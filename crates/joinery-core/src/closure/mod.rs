//! Closure - 中断された継続フレーム
//!
//! 1 つの中断点につき 1 つの `Closure` を作ります。
//!
//! # 持っているもの
//! - 通し番号 `id`（Runtime ごとに単調増加、診断用）
//! - 再開位置 `resume_target`（再開そのものはこのコアの外）
//! - CCEOC の記録と、スコープ終了時のチェック
//! - このフレームが関わった JoinGroup へのリンクと、フレームローカルな arena
//!
//! `Closure` は weak refcounted なので、JoinGroup からは `WeakRef` で
//! 「まだ生きているか」を観測できます。

mod cceoc;
mod frame;

pub use self::cceoc::{Cceoc, CceocState};
pub use self::frame::{GroupLink, GroupSite};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use self::frame::FrameArena;
use crate::app::Runtime;
use crate::domain::{ClosureId, Location};
use crate::error::Violation;
use crate::join::JoinGroup;
use crate::mortal::{HasMortality, MortalRef, MortalityFlags, WeakCount, WeakRefCounted};
use crate::ports::Action;

pub struct Closure {
    id: ClosureId,
    rt: Runtime,
    flags: MortalityFlags,
    weak: WeakCount,
    resume_target: Cell<u32>,
    cceoc_count: Cell<u32>,
    has_cceoc: Cell<bool>,
    cceoc: RefCell<Option<Rc<Cell<CceocState>>>>,
    join_groups: RefCell<Vec<GroupLink>>,
    frame: FrameArena,
}

impl Closure {
    pub fn new(rt: &Runtime) -> Rc<Self> {
        Self::build(rt, false)
    }

    /// A frame that was called with a CCEOC and must resume it exactly once.
    pub fn with_cceoc(rt: &Runtime) -> Rc<Self> {
        Self::build(rt, true)
    }

    fn build(rt: &Runtime, has_cceoc: bool) -> Rc<Self> {
        let closure = Rc::new(Self {
            id: rt.next_closure_id(),
            rt: rt.clone(),
            flags: MortalityFlags::new(),
            weak: WeakCount::new(Rc::clone(rt.scheduler())),
            resume_target: Cell::new(0),
            cceoc_count: Cell::new(0),
            has_cceoc: Cell::new(has_cceoc),
            cceoc: RefCell::new(None),
            join_groups: RefCell::new(Vec::new()),
            frame: FrameArena::default(),
        });
        tracing::trace!(closure = %closure.id, "closure created");
        closure
    }

    pub fn id(&self) -> ClosureId {
        self.id
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    // manage function reentry

    pub fn set_resume_target(&self, target: u32) {
        self.resume_target.set(target);
    }

    pub fn resume_target(&self) -> u32 {
        self.resume_target.get()
    }

    // CCEOC bookkeeping

    pub fn record_cceoc(&self) {
        self.cceoc_count.set(self.cceoc_count.get() + 1);
    }

    pub fn cceoc_count(&self) -> u32 {
        self.cceoc_count.get()
    }

    pub fn set_has_cceoc(&self, has: bool) {
        self.has_cceoc.set(has);
    }

    pub fn has_cceoc(&self) -> bool {
        self.has_cceoc.get()
    }

    /// State of the most recently handed-out CCEOC, if any.
    pub fn cceoc_state(&self) -> Option<CceocState> {
        self.cceoc.borrow().as_ref().map(|s| s.get())
    }

    /// Hand out the frame's resume handle.
    ///
    /// Only one may be outstanding; handing out a second while the first is
    /// still unused is reported, and the new handle replaces the old one for
    /// the end-of-scope check.
    pub fn cceoc<A: 'static>(
        self: &Rc<Self>,
        location: impl Into<Location>,
        callback: impl FnOnce(A) + 'static,
    ) -> Cceoc<A> {
        let location = location.into();
        if self.cceoc_state() == Some(CceocState::Unused) {
            self.rt
                .report(&location, Violation::CceocAlreadyOutstanding(self.id));
        }

        let state = Rc::new(Cell::new(CceocState::Unused));
        *self.cceoc.borrow_mut() = Some(Rc::clone(&state));
        self.has_cceoc.set(true);

        Cceoc::new(state, Rc::downgrade(self), location, Box::new(callback))
    }

    /// Scope-exit sanity checks, run wherever the frame unwinds.
    ///
    /// - CCEOC must have been resumed or discarded, and resumed at most once
    /// - join groups allocated in this frame must have nothing left to join
    ///   (each is marked dead, which reports its own leak)
    pub fn end_of_scope_checks(&self, location: impl Into<Location>) {
        let location = location.into();

        if self.has_cceoc.get() {
            let settled = self.cceoc_state().is_some_and(CceocState::is_settled);
            if !settled {
                self.rt.report(&location, Violation::CceocNotCalled(self.id));
            }
            let count = self.cceoc_count.get();
            if count > 1 {
                self.rt
                    .report(&location, Violation::CceocCalledTwice(self.id, count));
            }
        }

        for group in self.frame.residents() {
            group.mark_dead();
        }
    }

    // join group association

    /// Two-way link: the group already holds a weak ref to us; we keep a
    /// mortal ref to it so we can force it out of scope first.
    pub fn associate_join_group(&self, mortal: MortalRef, site: GroupSite) {
        self.join_groups.borrow_mut().push(GroupLink { mortal, site });
    }

    pub fn join_group_links(&self) -> Vec<GroupLink> {
        self.join_groups.borrow().clone()
    }

    /// Account for join groups that should be going out of scope as we are.
    ///
    /// Every associated group is marked dead, as is every group in this
    /// frame's arena; then the arena is released.
    pub fn kill_join_groups(&self) {
        let links = std::mem::take(&mut *self.join_groups.borrow_mut());
        tracing::debug!(closure = %self.id, groups = links.len(), "killing join groups");
        for link in &links {
            tracing::trace!(closure = %self.id, site = ?link.site, "killing join group");
            link.mortal.mark_dead();
        }
        for group in self.frame.residents() {
            group.mark_dead();
        }
        drop(self.frame.release_all());
    }

    /// Allocate a join group in this frame's arena.
    pub fn join_group<V: 'static>(self: &Rc<Self>, location: impl Into<Location>) -> JoinGroup<V> {
        let group = JoinGroup::new(&self.rt, location);
        let slot = self.frame.alloc(group.mortal());
        group.with_site(GroupSite::Frame {
            owner: self.id,
            slot,
        })
    }

    /// Frame-local join groups still held by the arena.
    pub fn frame_groups(&self) -> usize {
        self.frame.live()
    }

    // weak lifetime

    pub fn set_weak_finalize(&self, action: Action) {
        self.weak.set_finalize(action);
    }

    pub fn weak_incref(&self) {
        self.weak.incref();
    }

    pub fn weak_decref(&self) {
        self.weak.decref();
    }
}

impl HasMortality for Closure {
    fn mortality(&self) -> &MortalityFlags {
        &self.flags
    }
}

impl WeakRefCounted for Closure {
    fn weak_count(&self) -> &WeakCount {
        &self.weak
    }
}

impl Drop for Closure {
    fn drop(&mut self) {
        // observers must already see us as gone while groups are torn down
        self.flags.mark_destroyed();
        self.kill_join_groups();
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("id", &self.id)
            .field("resume_target", &self.resume_target.get())
            .field("cceoc_count", &self.cceoc_count.get())
            .field("has_cceoc", &self.has_cceoc.get())
            .field("weak", &self.weak)
            .finish()
    }
}
