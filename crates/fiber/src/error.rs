use crate::host::AdapterError;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Build,
    Commit,
}

/// Failure of one render pass. The renderer is idle again when this is
/// returned; the failed work tree has been discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    Adapter { phase: Phase, source: AdapterError },
    /// Engine invariant violation (bug), not a display-tree failure.
    Invariant(&'static str),
}

impl RenderError {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RenderError::Adapter { phase, .. } => Some(*phase),
            RenderError::Invariant(_) => None,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Adapter { phase, source } => {
                write!(f, "render aborted during {phase:?}: {source}")
            }
            RenderError::Invariant(what) => write!(f, "engine invariant violated: {what}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Adapter { source, .. } => Some(source),
            RenderError::Invariant(_) => None,
        }
    }
}
