//! Immutable description trees.
//!
//! A description tree says what the display should look like; it is built
//! once per render call, never mutated, and handed to the reconciler in
//! `fiber`. Nodes are cheap to clone (shared behind an `Arc`).

pub mod fixtures;
pub mod snapshot;
pub mod traverse;

mod builder;
mod types;

pub use crate::builder::{BuildError, Child, ElementBuilder, create_element, text};
pub use crate::snapshot::{Snapshot, SnapshotOptions, assert_trees_eq, compare_trees};
pub use crate::types::{
    AttrChange, AttrDiff, AttrValue, Attributes, CHILDREN_KEY, CONTAINER_TAG, Element, TEXT_TAG,
    TEXT_VALUE_KEY,
};
