//! Display-tree boundary.
//!
//! The engine never touches a concrete display tree; it drives one through
//! this trait. Each method is expected to be atomic: it either fully applies
//! or fails without side effects on the display tree.

use std::fmt;
use vdom::Attributes;

pub trait DisplayAdapter {
    /// Opaque reference to one display-tree node.
    type Handle: Copy + Eq + fmt::Debug;

    /// Allocate a node for `tag`.
    ///
    /// For `vdom::TEXT_TAG` this is a text node holding the `value`
    /// attribute; otherwise an element carrying every attribute except
    /// `value`.
    fn create_handle(
        &mut self,
        tag: &str,
        attributes: &Attributes,
    ) -> Result<Self::Handle, AdapterError>;

    fn append_child(&mut self, parent: Self::Handle, child: Self::Handle)
    -> Result<(), AdapterError>;

    /// Detach `child` (and with it its whole display subtree) from `parent`.
    fn remove_child(&mut self, parent: Self::Handle, child: Self::Handle)
    -> Result<(), AdapterError>;

    /// Apply the minimal change set from `old` to `new` (see
    /// `vdom::Attributes::diff`). Equal inputs must not touch the node.
    fn update_attributes(
        &mut self,
        handle: Self::Handle,
        tag: &str,
        old: &Attributes,
        new: &Attributes,
    ) -> Result<(), AdapterError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdapterOp {
    CreateHandle,
    AppendChild,
    RemoveChild,
    UpdateAttributes,
}

impl AdapterOp {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateHandle => "create handle",
            Self::AppendChild => "append child",
            Self::RemoveChild => "remove child",
            Self::UpdateAttributes => "update attributes",
        }
    }
}

/// A display-tree primitive failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterError {
    pub op: AdapterOp,
    pub message: String,
}

impl AdapterError {
    pub fn new(op: AdapterOp, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.op.label(), self.message)
    }
}

impl std::error::Error for AdapterError {}
