//! In-memory display tree.
//!
//! `Dom` is a plain retained node store (containers, elements and text nodes)
//! and the reference [`fiber::DisplayAdapter`] implementation. It validates
//! every primitive, so engine bugs surface as errors instead of a silently
//! corrupted tree, and it can turn any subtree back into a description for
//! snapshot comparisons.

mod adapter;
mod arena;
mod error;

pub use crate::error::DomError;

use crate::arena::{DomArena, NodeKind};
use fiber::AdapterOp;
use std::sync::Arc;
use vdom::{AttrValue, Element, Snapshot, SnapshotOptions};

/// Handle to one display node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    pub const INVALID: NodeKey = NodeKey(0);
}

/// Primitive call counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DomStats {
    pub containers_created: u64,
    pub elements_created: u64,
    pub texts_created: u64,
    pub appends: u64,
    pub removals: u64,
    pub attribute_sets: u64,
    pub attribute_removals: u64,
    pub text_sets: u64,
}

impl DomStats {
    /// Nodes created through the adapter boundary (containers excluded).
    pub fn nodes_created(&self) -> u64 {
        self.elements_created + self.texts_created
    }

    /// Every call that changed an existing node or the tree shape.
    pub fn mutations(&self) -> u64 {
        self.appends + self.removals + self.attribute_sets + self.attribute_removals + self.text_sets
    }
}

#[derive(Clone, Copy, Debug)]
struct Fault {
    op: AdapterOp,
    remaining: usize,
}

pub struct Dom {
    arena: DomArena,
    stats: DomStats,
    fault: Option<Fault>,
}

impl Dom {
    pub fn new() -> Self {
        Self {
            arena: DomArena::new(),
            stats: DomStats::default(),
            fault: None,
        }
    }

    /// Detached root node that render roots are appended to.
    pub fn create_container(&mut self) -> NodeKey {
        self.stats.containers_created += 1;
        let key = self.arena.insert_node(NodeKind::Container);
        log::debug!(target: "dom.store", "created container {key:?}");
        key
    }

    pub fn create_element<'a, I>(&mut self, tag: &str, attributes: I) -> Result<NodeKey, DomError>
    where
        I: IntoIterator<Item = (&'a str, &'a AttrValue)>,
    {
        if tag.is_empty() {
            return Err(DomError::EmptyTag);
        }
        let attributes = attributes
            .into_iter()
            .map(|(k, v)| (Arc::from(k), v.to_string()))
            .collect();
        self.stats.elements_created += 1;
        Ok(self.arena.insert_node(NodeKind::Element {
            tag: Arc::from(tag),
            attributes,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.stats.texts_created += 1;
        self.arena.insert_node(NodeKind::Text { text: text.into() })
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.arena.append_child(parent, child)?;
        self.stats.appends += 1;
        Ok(())
    }

    /// Detach `child` from `parent`; the detached subtree is dropped.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.arena.remove_child(parent, child)?;
        self.stats.removals += 1;
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        key: NodeKey,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let NodeKind::Element { attributes, .. } = &mut self.arena.get_mut(key)?.kind else {
            return Err(DomError::WrongNodeKind(key));
        };
        let value = value.into();
        match attributes.iter_mut().find(|(k, _)| &**k == name) {
            Some(slot) => slot.1 = value,
            None => attributes.push((Arc::from(name), value)),
        }
        self.stats.attribute_sets += 1;
        Ok(())
    }

    pub fn remove_attribute(&mut self, key: NodeKey, name: &str) -> Result<(), DomError> {
        let NodeKind::Element { attributes, .. } = &mut self.arena.get_mut(key)?.kind else {
            return Err(DomError::WrongNodeKind(key));
        };
        attributes.retain(|(k, _)| &**k != name);
        self.stats.attribute_removals += 1;
        Ok(())
    }

    pub fn set_text(&mut self, key: NodeKey, text: &str) -> Result<(), DomError> {
        let NodeKind::Text { text: existing } = &mut self.arena.get_mut(key)?.kind else {
            return Err(DomError::WrongNodeKind(key));
        };
        existing.clear();
        existing.push_str(text);
        self.stats.text_sets += 1;
        Ok(())
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.arena.get(key).is_ok()
    }

    pub fn live_nodes(&self) -> usize {
        self.arena.live_count()
    }

    /// Record slots held by the store, reused ones included.
    pub fn allocated_nodes(&self) -> usize {
        self.arena.capacity()
    }

    /// Free every node not reachable from a container, such as handles left
    /// by a discarded build. Handles of a build still in flight are detached
    /// too, so only call this while every renderer is idle.
    pub fn sweep_detached(&mut self) -> usize {
        let freed = self.arena.sweep_detached();
        if freed > 0 {
            log::debug!(target: "dom.store", "swept {freed} detached nodes");
        }
        freed
    }

    /// `None` for containers and text nodes.
    pub fn tag(&self, key: NodeKey) -> Option<&str> {
        match &self.arena.get(key).ok()?.kind {
            NodeKind::Element { tag, .. } => Some(&**tag),
            _ => None,
        }
    }

    pub fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        match &self.arena.get(key).ok()?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| &**k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, key: NodeKey) -> Option<&str> {
        match &self.arena.get(key).ok()?.kind {
            NodeKind::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.arena.get(key).ok()?.parent
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.arena
            .get(key)
            .map_or(&[][..], |record| record.children.as_slice())
    }

    /// Descriptions equivalent to the children of `key`.
    pub fn materialize_children(&self, key: NodeKey) -> Result<Vec<Element>, DomError> {
        self.arena.materialize_children(key)
    }

    pub fn snapshot(&self, key: NodeKey) -> Result<Snapshot, DomError> {
        let children = self.materialize_children(key)?;
        Ok(Snapshot::new(&children, SnapshotOptions::default()))
    }

    pub fn stats(&self) -> DomStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DomStats::default();
    }

    /// Make the `nth` (1-based) upcoming adapter call of kind `op` fail
    /// without touching the tree. Direct primitive calls are not affected.
    pub fn fail_on(&mut self, op: AdapterOp, nth: usize) {
        self.fault = Some(Fault {
            op,
            remaining: nth.max(1),
        });
    }

    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    fn check_fault(&mut self, op: AdapterOp) -> Result<(), DomError> {
        let Some(fault) = self.fault.as_mut() else {
            return Ok(());
        };
        if fault.op != op {
            return Ok(());
        }
        fault.remaining -= 1;
        if fault.remaining == 0 {
            self.fault = None;
            log::debug!(target: "dom.store", "injecting {} failure", op.label());
            return Err(DomError::Injected(op));
        }
        Ok(())
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
