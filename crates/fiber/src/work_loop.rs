//! Cooperative work loop.
//!
//! A `Renderer` is an explicit state machine:
//! - Idle: no work tree, no next unit.
//! - Building: a work tree exists and `next_unit` names the fiber to process.
//!
//! `render` moves Idle -> Building. Every `tick` performs whole units until
//! the tree is complete or the host's budget runs low; a complete tree is
//! committed inside the same tick and the renderer returns to Idle. The only
//! suspension point is between two units.

use crate::budget::{TimeBudget, Unbounded};
use crate::commit::{CommitAbort, CommitReport, commit_root};
use crate::config::{EngineConfig, InFlightPolicy};
use crate::error::{Phase, RenderError};
use crate::host::DisplayAdapter;
use crate::reconcile::reconcile_children;
use crate::stats::EngineStats;
use crate::tree::{FiberId, FiberTree};
use std::fmt;
use vdom::Element;

/// Outcome of one `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to do.
    Idle,
    /// The budget ran out with work remaining; call `tick` again.
    Yielded { units: usize },
    /// The work tree was completed and committed during this tick.
    Committed { units: usize },
}

impl Tick {
    pub fn is_done(self) -> bool {
        !matches!(self, Tick::Yielded { .. })
    }

    pub fn units(self) -> usize {
        match self {
            Tick::Idle => 0,
            Tick::Yielded { units } | Tick::Committed { units } => units,
        }
    }
}

/// A render being built.
#[derive(Clone, Debug)]
pub struct WorkInProgress<H> {
    tree: FiberTree<H>,
    next_unit: Option<FiberId>,
    deletions: Vec<FiberId>,
}

impl<H: Copy> WorkInProgress<H> {
    pub fn tree(&self) -> &FiberTree<H> {
        &self.tree
    }

    pub fn next_unit(&self) -> Option<FiberId> {
        self.next_unit
    }

    /// Fibers of the current tree scheduled for removal, in record order.
    pub fn deletions(&self) -> &[FiberId] {
        &self.deletions
    }
}

/// Reconciliation engine state for one render target.
///
/// The renderer does not own the display tree; every step takes the adapter
/// explicitly, so several renderers may drive containers of one display tree.
#[derive(Debug)]
pub struct Renderer<H> {
    config: EngineConfig,
    current: Option<FiberTree<H>>,
    wip: Option<WorkInProgress<H>>,
    queued: Option<(Element, H)>,
    last_commit: Option<CommitReport>,
    stats: EngineStats,
}

impl<H> Default for Renderer<H>
where
    H: Copy + Eq + fmt::Debug,
{
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<H> Renderer<H>
where
    H: Copy + Eq + fmt::Debug,
{
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            current: None,
            wip: None,
            queued: None,
            last_commit: None,
            stats: EngineStats::default(),
        }
    }

    /// Request that `element` be displayed inside `container`.
    ///
    /// Nothing is built here; the work happens in subsequent ticks.
    pub fn render(&mut self, element: Element, container: H) {
        self.stats.renders_requested = self.stats.renders_requested.saturating_add(1);
        if let Some(wip) = &self.wip {
            match self.config.in_flight {
                InFlightPolicy::Restart => {
                    log::warn!(
                        target: "fiber.work_loop",
                        "render requested mid-build; discarding {} built fibers",
                        wip.tree.len()
                    );
                    self.stats.restarts = self.stats.restarts.saturating_add(1);
                    self.wip = None;
                }
                InFlightPolicy::Queue => {
                    log::debug!(target: "fiber.work_loop", "render queued behind in-flight build");
                    self.stats.queued = self.stats.queued.saturating_add(1);
                    self.queued = Some((element, container));
                    return;
                }
            }
        }
        self.begin(element, container);
    }

    fn begin(&mut self, element: Element, container: H) {
        let previous = match &self.current {
            Some(current) if current.container() == container => Some(FiberId::ROOT),
            Some(current) => {
                log::warn!(
                    target: "fiber.work_loop",
                    "container changed from {:?} to {container:?}; starting without a baseline",
                    current.container()
                );
                self.current = None;
                None
            }
            None => None,
        };
        log::debug!(
            target: "fiber.work_loop",
            "begin render <{}> into {container:?} (update: {})",
            element.tag(),
            previous.is_some()
        );
        self.wip = Some(WorkInProgress {
            tree: FiberTree::new(element, container, previous),
            next_unit: Some(FiberId::ROOT),
            deletions: Vec::new(),
        });
    }

    /// Run whole units of work until the tree is complete or `budget` reports
    /// less than the yield threshold. Always performs at least one unit when
    /// work is pending.
    pub fn tick<A, B>(&mut self, adapter: &mut A, budget: &mut B) -> Result<Tick, RenderError>
    where
        A: DisplayAdapter<Handle = H>,
        B: TimeBudget + ?Sized,
    {
        self.stats.ticks = self.stats.ticks.saturating_add(1);
        let Some(wip) = self.wip.as_mut() else {
            return Ok(Tick::Idle);
        };

        let mut units = 0usize;
        while let Some(unit) = wip.next_unit {
            let next = match perform_unit(wip, unit, self.current.as_ref(), adapter, &mut self.stats) {
                Ok(next) => next,
                Err(err) => return Err(self.fail(err)),
            };
            wip.next_unit = next;
            units += 1;
            self.stats.units_performed = self.stats.units_performed.saturating_add(1);

            if wip.next_unit.is_some() && budget.time_remaining() < self.config.yield_threshold {
                self.stats.yields = self.stats.yields.saturating_add(1);
                log::trace!(target: "fiber.work_loop", "yield after {units} units");
                return Ok(Tick::Yielded { units });
            }
        }

        self.commit(adapter)?;
        Ok(Tick::Committed { units })
    }

    /// Drive ticks with an unbounded budget until idle, including any render
    /// queued behind the one in flight.
    pub fn flush<A>(&mut self, adapter: &mut A) -> Result<(), RenderError>
    where
        A: DisplayAdapter<Handle = H>,
    {
        while self.wip.is_some() {
            self.tick(adapter, &mut Unbounded)?;
        }
        Ok(())
    }

    fn commit<A>(&mut self, adapter: &mut A) -> Result<(), RenderError>
    where
        A: DisplayAdapter<Handle = H>,
    {
        let Some(mut wip) = self.wip.take() else {
            return Ok(());
        };
        let result = commit_root(&mut wip.tree, &wip.deletions, self.current.as_ref(), adapter);
        match result {
            Ok(report) => {
                log::debug!(
                    target: "fiber.work_loop",
                    "commit: {} units, {} placements, {} updates, {} deletions",
                    report.work_units,
                    report.placements,
                    report.updates,
                    report.deletions
                );
                self.stats.commits = self.stats.commits.saturating_add(1);
                self.current = Some(wip.tree);
                self.last_commit = Some(report);
                self.start_queued();
                Ok(())
            }
            Err(CommitAbort { error, structural }) => {
                if structural {
                    self.drop_baseline(adapter, &wip.tree);
                }
                Err(self.fail(error))
            }
        }
    }

    /// A commit that failed after changing the tree shape leaves a display
    /// the current fiber tree no longer describes. Detach both render roots
    /// from the container and forget the baseline, so the next render builds
    /// from scratch. Detaching is best effort: a root that is not attached
    /// simply fails to detach.
    fn drop_baseline<A>(&mut self, adapter: &mut A, failed: &FiberTree<H>)
    where
        A: DisplayAdapter<Handle = H>,
    {
        let root_handle = |tree: &FiberTree<H>| {
            tree.render_root()
                .and_then(|id| tree.get(id))
                .and_then(|fiber| fiber.handle())
        };
        let container = failed.container();
        let mut roots = vec![root_handle(failed)];
        if let Some(current) = self.current.take() {
            roots.push(root_handle(&current));
        }
        roots.dedup();
        for handle in roots.into_iter().flatten() {
            match adapter.remove_child(container, handle) {
                Ok(()) => log::debug!(
                    target: "fiber.work_loop",
                    "detached {handle:?} after partial commit"
                ),
                Err(err) => log::trace!(target: "fiber.work_loop", "{handle:?} not detached: {err}"),
            }
        }
        log::warn!(
            target: "fiber.work_loop",
            "commit failed after structural changes; next render into {container:?} starts without a baseline"
        );
    }

    fn fail(&mut self, err: RenderError) -> RenderError {
        log::error!(target: "fiber.work_loop", "{err}");
        self.stats.failed_renders = self.stats.failed_renders.saturating_add(1);
        self.wip = None;
        self.start_queued();
        err
    }

    fn start_queued(&mut self) {
        if let Some((element, container)) = self.queued.take() {
            self.begin(element, container);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.wip.is_none()
    }

    pub fn next_unit(&self) -> Option<FiberId> {
        self.wip.as_ref().and_then(|wip| wip.next_unit)
    }

    pub fn current(&self) -> Option<&FiberTree<H>> {
        self.current.as_ref()
    }

    pub fn work_in_progress(&self) -> Option<&WorkInProgress<H>> {
        self.wip.as_ref()
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }

    pub fn last_commit(&self) -> Option<&CommitReport> {
        self.last_commit.as_ref()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Process one fiber: give it a display handle if it lacks one, then expand
/// its description children. Returns the next unit in build order.
fn perform_unit<A>(
    wip: &mut WorkInProgress<A::Handle>,
    id: FiberId,
    current: Option<&FiberTree<A::Handle>>,
    adapter: &mut A,
    stats: &mut EngineStats,
) -> Result<Option<FiberId>, RenderError>
where
    A: DisplayAdapter,
{
    let fiber = wip.tree.node(id);
    if fiber.handle().is_none() {
        let handle = adapter
            .create_handle(fiber.tag(), fiber.attributes())
            .map_err(|source| RenderError::Adapter {
                phase: Phase::Build,
                source,
            })?;
        log::trace!(target: "fiber.work_loop", "created {handle:?} for <{}>", fiber.tag());
        wip.tree.node_mut(id).handle = Some(handle);
        stats.handles_created = stats.handles_created.saturating_add(1);
    }

    let counts = reconcile_children(&mut wip.tree, id, current, &mut wip.deletions);
    stats.placements = stats.placements.saturating_add(counts.placements);
    stats.updates = stats.updates.saturating_add(counts.updates);
    stats.deletions = stats.deletions.saturating_add(counts.deletions);

    Ok(wip.tree.next_unit_after(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::UnitBudget;
    use crate::host::{AdapterError, AdapterOp};
    use crate::Effect;
    use vdom::Attributes;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Op {
        Create(String, u32),
        Append(u32, u32),
        Remove(u32, u32),
        Update(u32, usize),
    }

    /// Adapter that hands out sequential handles and records every call.
    #[derive(Debug, Default)]
    struct Recorder {
        next: u32,
        ops: Vec<Op>,
        fail: Option<AdapterOp>,
    }

    impl Recorder {
        fn check(&mut self, op: AdapterOp) -> Result<(), AdapterError> {
            if self.fail == Some(op) {
                return Err(AdapterError::new(op, "injected"));
            }
            Ok(())
        }

        fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
            self.ops.iter().filter(|op| pred(op)).count()
        }
    }

    impl DisplayAdapter for Recorder {
        type Handle = u32;

        fn create_handle(&mut self, tag: &str, _: &Attributes) -> Result<u32, AdapterError> {
            self.check(AdapterOp::CreateHandle)?;
            self.next += 1;
            self.ops.push(Op::Create(tag.to_string(), self.next));
            Ok(self.next)
        }

        fn append_child(&mut self, parent: u32, child: u32) -> Result<(), AdapterError> {
            self.check(AdapterOp::AppendChild)?;
            self.ops.push(Op::Append(parent, child));
            Ok(())
        }

        fn remove_child(&mut self, parent: u32, child: u32) -> Result<(), AdapterError> {
            self.check(AdapterOp::RemoveChild)?;
            self.ops.push(Op::Remove(parent, child));
            Ok(())
        }

        fn update_attributes(
            &mut self,
            handle: u32,
            _: &str,
            old: &Attributes,
            new: &Attributes,
        ) -> Result<(), AdapterError> {
            self.check(AdapterOp::UpdateAttributes)?;
            self.ops.push(Op::Update(handle, Attributes::diff(old, new).count()));
            Ok(())
        }
    }

    const CONTAINER: u32 = 0;

    fn el(tag: &str, children: Vec<Element>) -> Element {
        Element::builder(tag).children(children).build().unwrap()
    }

    fn div_ab() -> Element {
        el("div", vec![el("a", vec![]), el("b", vec![])])
    }

    fn root_tag(renderer: &Renderer<u32>) -> Option<String> {
        let current = renderer.current()?;
        let id = current.render_root()?;
        Some(current.get(id)?.tag().to_string())
    }

    #[test]
    fn idle_renderer_ticks_idle() {
        let mut renderer = Renderer::<u32>::default();
        let mut adapter = Recorder::default();
        assert_eq!(renderer.tick(&mut adapter, &mut Unbounded), Ok(Tick::Idle));
        assert!(renderer.is_idle());
        assert!(adapter.ops.is_empty());
    }

    #[test]
    fn render_only_schedules_work() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        assert!(!renderer.is_idle());
        assert_eq!(renderer.next_unit(), Some(FiberId::ROOT));
        assert!(adapter.ops.is_empty());

        let tick = renderer.tick(&mut adapter, &mut Unbounded).unwrap();
        assert_eq!(tick, Tick::Committed { units: 4 });
        assert!(renderer.is_idle());
        assert_eq!(root_tag(&renderer).as_deref(), Some("div"));
    }

    #[test]
    fn one_unit_per_tick_under_exhausted_budget() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);

        let mut ticks = Vec::new();
        loop {
            let tick = renderer.tick(&mut adapter, &mut UnitBudget::new(1)).unwrap();
            ticks.push(tick);
            if tick.is_done() {
                break;
            }
            assert_eq!(adapter.count(|op| matches!(op, Op::Append(..))), 0);
        }
        assert_eq!(
            ticks,
            vec![
                Tick::Yielded { units: 1 },
                Tick::Yielded { units: 1 },
                Tick::Yielded { units: 1 },
                Tick::Committed { units: 1 },
            ]
        );
        assert_eq!(renderer.stats().yields, 3);
        assert_eq!(renderer.stats().units_performed, 4);
    }

    #[test]
    fn commit_appends_in_preorder_after_all_creates() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        assert_eq!(
            adapter.ops,
            vec![
                Op::Create("div".into(), 1),
                Op::Create("a".into(), 2),
                Op::Create("b".into(), 3),
                Op::Append(CONTAINER, 1),
                Op::Append(1, 2),
                Op::Append(1, 3),
            ]
        );
        let report = renderer.last_commit().unwrap();
        assert_eq!(report.work_units, 3);
        assert_eq!(report.placements, 3);
        assert!(report.records.iter().all(|r| !r.has_alternate));
    }

    #[test]
    fn identical_rerender_only_updates() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        adapter.ops.clear();

        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        assert_eq!(
            adapter.ops,
            vec![Op::Update(1, 0), Op::Update(2, 0), Op::Update(3, 0)]
        );
        let report = renderer.last_commit().unwrap();
        assert!(report.is_structurally_unchanged());
        assert_eq!(report.with_effect(Effect::Update).count(), 3);
    }

    #[test]
    fn committed_tree_carries_no_effects_or_alternates() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        for _ in 0..2 {
            renderer.render(div_ab(), CONTAINER);
            renderer.flush(&mut adapter).unwrap();
        }
        let current = renderer.current().unwrap();
        assert!(current.preorder().all(|id| {
            let fiber = current.get(id).unwrap();
            fiber.effect() == Effect::None && fiber.alternate().is_none()
        }));
    }

    #[test]
    fn restart_discards_partial_work() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.tick(&mut adapter, &mut UnitBudget::new(1)).unwrap();
        renderer.tick(&mut adapter, &mut UnitBudget::new(1)).unwrap();

        renderer.render(el("p", vec![]), CONTAINER);
        assert_eq!(renderer.stats().restarts, 1);
        assert_eq!(renderer.work_in_progress().unwrap().tree().len(), 1);
        renderer.flush(&mut adapter).unwrap();

        assert_eq!(root_tag(&renderer).as_deref(), Some("p"));
        assert_eq!(adapter.ops.last(), Some(&Op::Append(CONTAINER, 2)));
        assert_eq!(adapter.count(|op| matches!(op, Op::Append(..))), 1);
    }

    #[test]
    fn queue_keeps_latest_request_until_commit() {
        let config = EngineConfig {
            in_flight: InFlightPolicy::Queue,
            ..EngineConfig::default()
        };
        let mut renderer = Renderer::new(config);
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.tick(&mut adapter, &mut UnitBudget::new(1)).unwrap();
        renderer.render(el("p", vec![]), CONTAINER);
        renderer.render(el("section", vec![]), CONTAINER);
        assert!(renderer.has_queued());
        assert_eq!(renderer.stats().queued, 2);

        while !renderer.tick(&mut adapter, &mut Unbounded).unwrap().is_done() {}
        assert_eq!(root_tag(&renderer).as_deref(), Some("div"));
        assert!(!renderer.is_idle());
        assert!(!renderer.has_queued());

        renderer.flush(&mut adapter).unwrap();
        assert_eq!(root_tag(&renderer).as_deref(), Some("section"));
        assert_eq!(renderer.stats().commits, 2);
    }

    #[test]
    fn build_failure_discards_work_and_keeps_current() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(el("div", vec![]), CONTAINER);
        renderer.flush(&mut adapter).unwrap();

        adapter.fail = Some(AdapterOp::CreateHandle);
        renderer.render(div_ab(), CONTAINER);
        let err = renderer.flush(&mut adapter).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Build));
        assert!(renderer.is_idle());
        assert_eq!(renderer.stats().failed_renders, 1);
        assert_eq!(renderer.current().unwrap().len(), 2);

        adapter.fail = None;
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        let report = renderer.last_commit().unwrap();
        assert_eq!((report.updates, report.placements), (1, 2));
    }

    #[test]
    fn commit_failure_is_reported_once() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder {
            fail: Some(AdapterOp::AppendChild),
            ..Recorder::default()
        };
        renderer.render(div_ab(), CONTAINER);
        let err = renderer.tick(&mut adapter, &mut Unbounded).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Commit));
        assert!(renderer.is_idle());
        assert!(renderer.current().is_none());
        assert_eq!(renderer.tick(&mut adapter, &mut Unbounded), Ok(Tick::Idle));
    }

    #[test]
    fn commit_failure_after_a_removal_detaches_and_forgets_the_baseline() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        adapter.ops.clear();

        adapter.fail = Some(AdapterOp::UpdateAttributes);
        renderer.render(el("div", vec![el("a", vec![])]), CONTAINER);
        let err = renderer.flush(&mut adapter).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Commit));
        assert_eq!(adapter.ops, vec![Op::Remove(1, 3), Op::Remove(CONTAINER, 1)]);
        assert!(renderer.current().is_none());

        adapter.fail = None;
        adapter.ops.clear();
        renderer.render(el("div", vec![el("a", vec![])]), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        assert_eq!(adapter.count(|op| matches!(op, Op::Create(..))), 2);
        assert_eq!(adapter.count(|op| matches!(op, Op::Remove(..))), 0);
        assert_eq!(renderer.last_commit().unwrap().placements, 2);
    }

    #[test]
    fn commit_failure_before_any_structural_change_keeps_the_baseline() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        adapter.ops.clear();

        adapter.fail = Some(AdapterOp::UpdateAttributes);
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap_err();
        assert!(adapter.ops.is_empty());
        assert_eq!(root_tag(&renderer).as_deref(), Some("div"));
    }

    #[test]
    fn switching_container_starts_without_baseline() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        adapter.ops.clear();

        renderer.render(div_ab(), 99);
        renderer.flush(&mut adapter).unwrap();
        assert_eq!(adapter.count(|op| matches!(op, Op::Remove(..))), 0);
        assert_eq!(adapter.count(|op| matches!(op, Op::Create(..))), 3);
        assert_eq!(adapter.ops[3], Op::Append(99, 4));
        assert_eq!(renderer.current().unwrap().container(), 99);
    }

    #[test]
    fn deletions_run_before_placements() {
        let mut renderer = Renderer::default();
        let mut adapter = Recorder::default();
        renderer.render(div_ab(), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        adapter.ops.clear();

        renderer.render(el("div", vec![el("a", vec![]), el("i", vec![])]), CONTAINER);
        renderer.flush(&mut adapter).unwrap();
        assert_eq!(
            adapter.ops,
            vec![
                Op::Create("i".into(), 4),
                Op::Remove(1, 3),
                Op::Update(1, 0),
                Op::Update(2, 0),
                Op::Append(1, 4),
            ]
        );
    }
}
