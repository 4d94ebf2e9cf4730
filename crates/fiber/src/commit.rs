//! Commit phase: apply a finished work tree to the display tree.
//!
//! Order:
//! 1. Deletions, in the order the reconciler recorded them. Only the deleted
//!    fiber's own handle is detached; its descendants go with it.
//! 2. Placements and updates in pre-order (fiber, child, then sibling),
//!    walked with an explicit stack.
//!
//! The first failing adapter call aborts the walk. The display tree keeps
//! whatever was applied before the failure; there is no rollback. The abort
//! tells the caller whether the tree shape already changed, in which case the
//! previous fiber tree no longer describes the display.

use crate::error::{Phase, RenderError};
use crate::host::DisplayAdapter;
use crate::tree::{FiberId, FiberTree};
use crate::Effect;
use std::sync::Arc;

/// One applied effect, in commit order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectRecord {
    pub tag: Arc<str>,
    pub effect: Effect,
    /// Depth below the container (the render root is 1).
    pub depth: usize,
    pub has_alternate: bool,
}

/// Summary of one commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Fibers built for the description, container excluded.
    pub work_units: usize,
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    pub records: Vec<EffectRecord>,
}

impl CommitReport {
    pub fn with_effect(&self, effect: Effect) -> impl Iterator<Item = &EffectRecord> {
        self.records.iter().filter(move |r| r.effect == effect)
    }

    /// No display node was created, attached or detached.
    pub fn is_structurally_unchanged(&self) -> bool {
        self.placements == 0 && self.deletions == 0
    }

    fn record(&mut self, tag: Arc<str>, effect: Effect, depth: usize, has_alternate: bool) {
        match effect {
            Effect::Placement => self.placements += 1,
            Effect::Update => self.updates += 1,
            Effect::Deletion => self.deletions += 1,
            Effect::None => return,
        }
        self.records.push(EffectRecord {
            tag,
            effect,
            depth,
            has_alternate,
        });
    }
}

/// A commit stopped at a failing adapter call.
#[derive(Debug)]
pub(crate) struct CommitAbort {
    pub error: RenderError,
    /// At least one append or removal went through before the failure.
    pub structural: bool,
}

pub(crate) fn commit_root<A: DisplayAdapter>(
    tree: &mut FiberTree<A::Handle>,
    deletions: &[FiberId],
    current: Option<&FiberTree<A::Handle>>,
    adapter: &mut A,
) -> Result<CommitReport, CommitAbort> {
    let mut report = CommitReport {
        work_units: tree.len().saturating_sub(1),
        ..CommitReport::default()
    };
    // Placements and deletions are only recorded once their call succeeded.
    if let Err(error) = apply_effects(tree, deletions, current, adapter, &mut report) {
        return Err(CommitAbort {
            error,
            structural: !report.is_structurally_unchanged(),
        });
    }
    tree.retire_effects();
    Ok(report)
}

fn apply_effects<A: DisplayAdapter>(
    tree: &FiberTree<A::Handle>,
    deletions: &[FiberId],
    current: Option<&FiberTree<A::Handle>>,
    adapter: &mut A,
    report: &mut CommitReport,
) -> Result<(), RenderError> {
    if !deletions.is_empty() {
        let Some(current) = current else {
            debug_assert!(false, "deletions recorded without a current tree");
            return Err(RenderError::Invariant("deletions without current tree"));
        };
        for &deleted in deletions {
            commit_deletion(current, deleted, adapter)?;
            let fiber = current.node(deleted);
            report.record(fiber.tag_arc(), Effect::Deletion, current.depth(deleted), false);
        }
    }

    let mut stack: Vec<(FiberId, usize)> = tree.render_root().map(|id| (id, 1)).into_iter().collect();
    while let Some((id, depth)) = stack.pop() {
        let fiber = tree.node(id);
        if let Some(sibling) = fiber.sibling() {
            stack.push((sibling.id(), depth));
        }
        if let Some(child) = fiber.child() {
            stack.push((child.id(), depth + 1));
        }

        let Some(handle) = fiber.handle() else {
            debug_assert!(false, "committed fiber without handle");
            return Err(RenderError::Invariant("committed fiber without handle"));
        };
        match fiber.effect() {
            Effect::Placement => {
                let parent = tree
                    .nearest_handle_above(id)
                    .ok_or(RenderError::Invariant("placement without ancestor handle"))?;
                log::trace!(target: "fiber.commit", "append <{}> {handle:?} to {parent:?}", fiber.tag());
                adapter
                    .append_child(parent, handle)
                    .map_err(|source| RenderError::Adapter {
                        phase: Phase::Commit,
                        source,
                    })?;
            }
            Effect::Update => {
                let old = fiber
                    .alternate()
                    .zip(current)
                    .map(|(alternate, current)| current.node(alternate.id()))
                    .ok_or(RenderError::Invariant("update without alternate"))?;
                adapter
                    .update_attributes(handle, fiber.tag(), old.attributes(), fiber.attributes())
                    .map_err(|source| RenderError::Adapter {
                        phase: Phase::Commit,
                        source,
                    })?;
            }
            Effect::None | Effect::Deletion => {}
        }
        report.record(
            fiber.tag_arc(),
            fiber.effect(),
            depth,
            fiber.alternate().is_some(),
        );
    }
    Ok(())
}

fn commit_deletion<A: DisplayAdapter>(
    current: &FiberTree<A::Handle>,
    deleted: FiberId,
    adapter: &mut A,
) -> Result<(), RenderError> {
    let fiber = current.node(deleted);
    let (Some(handle), Some(parent)) = (fiber.handle(), current.nearest_handle_above(deleted))
    else {
        debug_assert!(false, "deleted fiber without handle or ancestor handle");
        return Err(RenderError::Invariant("deletion without handle"));
    };
    log::trace!(target: "fiber.commit", "remove <{}> {handle:?} from {parent:?}", fiber.tag());
    adapter
        .remove_child(parent, handle)
        .map_err(|source| RenderError::Adapter {
            phase: Phase::Commit,
            source,
        })
}
