use crate::{DomError, NodeKey};
use std::collections::HashMap;
use std::sync::Arc;
use vdom::{Attributes, Element, create_element};

pub(crate) enum NodeKind {
    Container,
    Element {
        tag: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
    },
    Text {
        text: String,
    },
}

pub(crate) struct NodeRecord {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Container | NodeKind::Element { .. })
    }
}

/// Node storage. Records of dropped nodes are freed and their slots reused;
/// keys are never reused, so a stale key stays unknown.
pub(crate) struct DomArena {
    nodes: Vec<Option<NodeRecord>>,
    free: Vec<usize>,
    live: HashMap<NodeKey, usize>,
    next_key: u32,
}

impl DomArena {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            live: HashMap::new(),
            next_key: 1,
        }
    }

    pub(crate) fn insert_node(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key = self.next_key.wrapping_add(1).max(1);
        let record = Some(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = record;
                index
            }
            None => {
                self.nodes.push(record);
                self.nodes.len() - 1
            }
        };
        self.live.insert(key, index);
        key
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Allocated record slots, free ones included.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn index_of(&self, key: NodeKey) -> Result<usize, DomError> {
        if key == NodeKey::INVALID {
            return Err(DomError::InvalidKey(key));
        }
        self.live.get(&key).copied().ok_or(DomError::UnknownNode(key))
    }

    pub(crate) fn get(&self, key: NodeKey) -> Result<&NodeRecord, DomError> {
        let index = self.index_of(key)?;
        self.nodes[index].as_ref().ok_or(DomError::UnknownNode(key))
    }

    pub(crate) fn get_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomError> {
        let index = self.index_of(key)?;
        self.nodes[index].as_mut().ok_or(DomError::UnknownNode(key))
    }

    pub(crate) fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        if !self.get(parent)?.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if self.get(child)?.parent.is_some() {
            return Err(DomError::AlreadyAttached(child));
        }
        if parent == child || self.is_descendant(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent` and drop its whole subtree from the live
    /// set.
    pub(crate) fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.get(parent)?;
        if self.get(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.get_mut(parent)?.children.retain(|k| *k != child);
        self.get_mut(child)?.parent = None;
        self.drop_subtree(child);
        Ok(())
    }

    fn drop_subtree(&mut self, key: NodeKey) -> usize {
        let mut dropped = 0;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(index) = self.live.remove(&current) else {
                continue;
            };
            if let Some(record) = self.nodes[index].take() {
                stack.extend(record.children);
            }
            self.free.push(index);
            dropped += 1;
        }
        dropped
    }

    /// Free every node that is neither a container nor attached below one.
    pub(crate) fn sweep_detached(&mut self) -> usize {
        let orphans: Vec<NodeKey> = self
            .live
            .iter()
            .filter(|&(_, &index)| {
                self.nodes[index].as_ref().is_some_and(|record| {
                    record.parent.is_none() && !matches!(record.kind, NodeKind::Container)
                })
            })
            .map(|(&key, _)| key)
            .collect();
        orphans.into_iter().map(|key| self.drop_subtree(key)).sum()
    }

    fn is_descendant(&self, ancestor: NodeKey, maybe_descendant: NodeKey) -> bool {
        let Ok(record) = self.get(ancestor) else {
            return false;
        };
        let mut stack: Vec<NodeKey> = record.children.clone();
        while let Some(current) = stack.pop() {
            if current == maybe_descendant {
                return true;
            }
            if let Ok(record) = self.get(current) {
                stack.extend(record.children.iter().copied());
            }
        }
        false
    }

    pub(crate) fn materialize_children(&self, key: NodeKey) -> Result<Vec<Element>, DomError> {
        self.get(key)?
            .children
            .iter()
            .map(|child| self.materialize(*child))
            .collect()
    }

    fn materialize(&self, key: NodeKey) -> Result<Element, DomError> {
        let record = self.get(key)?;
        match &record.kind {
            NodeKind::Text { text } => Ok(vdom::text(text.as_str())),
            NodeKind::Element { tag, attributes } => {
                let attributes: Attributes = attributes
                    .iter()
                    .map(|(k, v)| (Arc::clone(k), v.as_str()))
                    .collect();
                let children = self.materialize_children(key)?;
                Ok(create_element(tag, attributes, children)?)
            }
            NodeKind::Container => Err(DomError::WrongNodeKind(key)),
        }
    }
}
