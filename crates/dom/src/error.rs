use crate::NodeKey;
use fiber::{AdapterError, AdapterOp};
use std::fmt;
use vdom::BuildError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    InvalidKey(NodeKey),
    UnknownNode(NodeKey),
    EmptyTag,
    WrongNodeKind(NodeKey),
    /// The node cannot hold children.
    InvalidParent(NodeKey),
    /// The node is already attached somewhere.
    AlreadyAttached(NodeKey),
    NotAChild { parent: NodeKey, child: NodeKey },
    CycleDetected { parent: NodeKey, child: NodeKey },
    /// A stored node could not be turned back into a description.
    Materialize(BuildError),
    /// Failure requested through [`crate::Dom::fail_on`].
    Injected(AdapterOp),
}

impl DomError {
    pub(crate) fn into_adapter(self, op: AdapterOp) -> AdapterError {
        AdapterError::new(op, self.to_string())
    }
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::InvalidKey(key) => write!(f, "invalid node key {key:?}"),
            DomError::UnknownNode(key) => write!(f, "unknown node {key:?}"),
            DomError::EmptyTag => f.write_str("element tag must not be empty"),
            DomError::WrongNodeKind(key) => write!(f, "operation not supported by node {key:?}"),
            DomError::InvalidParent(key) => write!(f, "node {key:?} cannot have children"),
            DomError::AlreadyAttached(key) => write!(f, "node {key:?} already has a parent"),
            DomError::NotAChild { parent, child } => {
                write!(f, "node {child:?} is not a child of {parent:?}")
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "appending {child:?} to {parent:?} would create a cycle")
            }
            DomError::Materialize(err) => write!(f, "cannot materialize node: {err}"),
            DomError::Injected(op) => write!(f, "injected {} failure", op.label()),
        }
    }
}

impl std::error::Error for DomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DomError::Materialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BuildError> for DomError {
    fn from(value: BuildError) -> Self {
        DomError::Materialize(value)
    }
}
