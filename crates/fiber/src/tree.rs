//! Fiber trees.
//!
//! A render builds one `FiberTree`; committing it turns it into the current
//! tree, and the previous current tree is dropped as a whole. Nodes live in a
//! per-tree arena and refer to each other by `FiberId`.
//!
//! Invariants:
//! - `FiberId::ROOT` is the synthetic container fiber; its handle is the
//!   container and its element wraps the render root.
//! - `child`/`sibling` are owning edges: every non-root fiber is reachable
//!   from the root through exactly one of them.
//! - `parent` is a back edge inside the same tree.
//! - `alternate` points into the *previous* committed tree and is only valid
//!   while that tree is alive; it is cleared when the tree is committed.

use crate::Effect;
use std::sync::Arc;
use vdom::{Attributes, Element};

/// Index of a fiber inside one tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(u32);

impl FiberId {
    pub const ROOT: FiberId = FiberId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owning edge to a first child or next sibling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Owned(FiberId);

impl Owned {
    pub fn id(self) -> FiberId {
        self.0
    }
}

/// Back edge to the parent fiber in the same tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(FiberId);

impl Parent {
    pub fn id(self) -> FiberId {
        self.0
    }
}

/// Cross-tree edge to the fiber at the same position in the previously
/// committed tree. Never followed for ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alternate(FiberId);

impl Alternate {
    pub fn id(self) -> FiberId {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct Fiber<H> {
    element: Element,
    pub(crate) handle: Option<H>,
    pub(crate) parent: Option<Parent>,
    pub(crate) child: Option<Owned>,
    pub(crate) sibling: Option<Owned>,
    pub(crate) alternate: Option<Alternate>,
    pub(crate) effect: Effect,
}

impl<H: Copy> Fiber<H> {
    pub(crate) fn placement(element: Element, parent: FiberId) -> Self {
        Self {
            element,
            handle: None,
            parent: Some(Parent(parent)),
            child: None,
            sibling: None,
            alternate: None,
            effect: Effect::Placement,
        }
    }

    pub(crate) fn update(
        element: Element,
        handle: Option<H>,
        parent: FiberId,
        alternate: FiberId,
    ) -> Self {
        Self {
            element,
            handle,
            parent: Some(Parent(parent)),
            child: None,
            sibling: None,
            alternate: Some(Alternate(alternate)),
            effect: Effect::Update,
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn tag(&self) -> &str {
        self.element.tag()
    }

    pub fn tag_arc(&self) -> Arc<str> {
        self.element.tag_arc()
    }

    pub fn attributes(&self) -> &Attributes {
        self.element.attributes()
    }

    pub fn handle(&self) -> Option<H> {
        self.handle
    }

    pub fn parent(&self) -> Option<Parent> {
        self.parent
    }

    pub fn child(&self) -> Option<Owned> {
        self.child
    }

    pub fn sibling(&self) -> Option<Owned> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<Alternate> {
        self.alternate
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }
}

#[derive(Clone, Debug)]
pub struct FiberTree<H> {
    nodes: Vec<Fiber<H>>,
    container: H,
}

impl<H: Copy> FiberTree<H> {
    /// Tree holding only the container fiber, whose single description child
    /// is `root`.
    pub(crate) fn new(root: Element, container: H, previous: Option<FiberId>) -> Self {
        let fiber = Fiber {
            element: Element::container(root),
            handle: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate: previous.map(Alternate),
            effect: Effect::None,
        };
        Self {
            nodes: vec![fiber],
            container,
        }
    }

    pub fn root(&self) -> &Fiber<H> {
        &self.nodes[0]
    }

    pub fn container(&self) -> H {
        self.container
    }

    /// First fiber below the container, i.e. the fiber of the render root.
    pub fn render_root(&self) -> Option<FiberId> {
        self.root().child.map(Owned::id)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<H>> {
        self.nodes.get(id.index())
    }

    /// Number of fibers, container included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn preorder(&self) -> FiberPreorder<'_, H> {
        FiberPreorder {
            tree: self,
            stack: vec![FiberId::ROOT],
        }
    }

    /// Next unit after `id` in build order: first child, else the nearest
    /// sibling of `id` or of one of its ancestors.
    pub fn next_unit_after(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.node(id);
        if let Some(child) = fiber.child {
            return Some(child.id());
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.node(current);
            if let Some(sibling) = fiber.sibling {
                return Some(sibling.id());
            }
            cursor = fiber.parent.map(Parent::id);
        }
        None
    }

    /// Handle of the closest ancestor that has one.
    pub fn nearest_handle_above(&self, id: FiberId) -> Option<H> {
        let mut cursor = self.node(id).parent;
        while let Some(parent) = cursor {
            let fiber = self.node(parent.id());
            if let Some(handle) = fiber.handle {
                return Some(handle);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Distance from the container fiber.
    pub fn depth(&self, id: FiberId) -> usize {
        let mut depth = 0;
        let mut cursor = self.node(id).parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.node(parent.id()).parent;
        }
        depth
    }

    pub(crate) fn node(&self, id: FiberId) -> &Fiber<H> {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: FiberId) -> &mut Fiber<H> {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn push(&mut self, fiber: Fiber<H>) -> FiberId {
        debug_assert!(self.nodes.len() < u32::MAX as usize, "fiber arena overflow");
        let id = FiberId(self.nodes.len() as u32);
        self.nodes.push(fiber);
        id
    }

    /// Link `child` as the next child of `parent`, after `previous` if given.
    pub(crate) fn link_child(&mut self, parent: FiberId, previous: Option<FiberId>, child: FiberId) {
        match previous {
            None => self.node_mut(parent).child = Some(Owned(child)),
            Some(prev) => self.node_mut(prev).sibling = Some(Owned(child)),
        }
    }

    /// Drop cross-tree edges and pending effects once this tree is current.
    pub(crate) fn retire_effects(&mut self) {
        for fiber in &mut self.nodes {
            fiber.alternate = None;
            fiber.effect = Effect::None;
        }
    }
}

/// Pre-order walk over a fiber tree (fiber, its children, then its siblings).
#[derive(Debug)]
pub struct FiberPreorder<'a, H> {
    tree: &'a FiberTree<H>,
    stack: Vec<FiberId>,
}

impl<H: Copy> Iterator for FiberPreorder<'_, H> {
    type Item = FiberId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let fiber = self.tree.node(id);
        if let Some(sibling) = fiber.sibling {
            self.stack.push(sibling.id());
        }
        if let Some(child) = fiber.child {
            self.stack.push(child.id());
        }
        Some(id)
    }
}
