//! Incremental reconciliation engine.
//!
//! `Renderer::render` schedules a description tree for a container. The
//! work loop then builds a fiber tree one unit at a time, comparing each
//! fiber's children against the previously committed tree by position, and
//! yields to the host between units whenever its [`TimeBudget`] runs low.
//! Once every unit is done the commit phase applies the collected effects to
//! the display tree through a [`DisplayAdapter`] in a single uninterrupted
//! pass.

mod budget;
mod commit;
mod config;
mod error;
mod host;
mod reconcile;
mod stats;
mod tree;
mod work_loop;

pub use crate::budget::{Deadline, TimeBudget, Unbounded, UnitBudget};
pub use crate::commit::{CommitReport, EffectRecord};
pub use crate::config::{EngineConfig, InFlightPolicy};
pub use crate::error::{Phase, RenderError};
pub use crate::host::{AdapterError, AdapterOp, DisplayAdapter};
pub use crate::stats::EngineStats;
pub use crate::tree::{Alternate, Fiber, FiberId, FiberPreorder, FiberTree, Owned, Parent};
pub use crate::work_loop::{Renderer, Tick, WorkInProgress};

/// Pending display-tree change attached to a fiber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Nothing to apply. Committed fibers always carry this.
    #[default]
    None,
    /// Fresh handle, to be appended under the nearest ancestor handle.
    Placement,
    /// Reused handle; attributes are diffed against the alternate.
    Update,
    /// Reported for alternates removed from the display tree.
    Deletion,
}
