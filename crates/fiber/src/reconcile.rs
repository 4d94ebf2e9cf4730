//! Positional child reconciliation.
//!
//! Children are compared index by index against the alternate's child list.
//! There is no key matching: a reorder shows up as per-position updates,
//! placements and deletions.

use crate::tree::{Fiber, FiberId, FiberTree, Owned};
use crate::Effect;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ReconcileCounts {
    pub placements: u64,
    pub updates: u64,
    pub deletions: u64,
}

/// Expand `id`'s description children into child fibers of `id`.
///
/// `current` is only read. Replaced or dropped alternates are appended to
/// `deletions`; they never enter the work tree's child/sibling chain.
pub(crate) fn reconcile_children<H: Copy>(
    wip: &mut FiberTree<H>,
    id: FiberId,
    current: Option<&FiberTree<H>>,
    deletions: &mut Vec<FiberId>,
) -> ReconcileCounts {
    let element = wip.node(id).element().clone();
    let mut old = match (current, wip.node(id).alternate()) {
        (Some(current), Some(alternate)) => current.node(alternate.id()).child().map(Owned::id),
        _ => None,
    };
    let mut counts = ReconcileCounts::default();
    let mut previous: Option<FiberId> = None;
    let mut elements = element.children().iter();

    loop {
        let next = elements.next();
        let old_fiber = match (current, old) {
            (Some(current), Some(old_id)) => Some((old_id, current.node(old_id))),
            _ => None,
        };

        let fiber = match (next, old_fiber) {
            (None, None) => break,
            (Some(desc), Some((old_id, old_fiber))) if old_fiber.tag() == desc.tag() => {
                counts.updates += 1;
                log::trace!(target: "fiber.reconcile", "reuse <{}> {old_id:?}", desc.tag());
                Some(Fiber::update(desc.clone(), old_fiber.handle(), id, old_id))
            }
            (Some(desc), replaced) => {
                if let Some((old_id, old_fiber)) = replaced {
                    counts.deletions += 1;
                    deletions.push(old_id);
                    log::trace!(
                        target: "fiber.reconcile",
                        "replace <{}> {old_id:?} with <{}>",
                        old_fiber.tag(),
                        desc.tag()
                    );
                }
                counts.placements += 1;
                Some(Fiber::placement(desc.clone(), id))
            }
            (None, Some((old_id, old_fiber))) => {
                counts.deletions += 1;
                deletions.push(old_id);
                log::trace!(target: "fiber.reconcile", "drop <{}> {old_id:?}", old_fiber.tag());
                None
            }
        };

        old = old_fiber.and_then(|(_, f)| f.sibling()).map(Owned::id);

        if let Some(fiber) = fiber {
            debug_assert!(matches!(fiber.effect(), Effect::Placement | Effect::Update));
            let child = wip.push(fiber);
            wip.link_child(id, previous, child);
            previous = Some(child);
        }
    }

    counts
}
