use crate::types::Element;

/// Number of nodes in the tree rooted at `root`, including `root`.
pub fn count_nodes(root: &Element) -> usize {
    preorder(root).count()
}

/// Depth of the deepest node; a lone root has depth 0.
pub fn max_depth(root: &Element) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(node.children().iter().map(|c| (c, depth + 1)));
    }
    deepest
}

pub fn preorder(root: &Element) -> Preorder<'_> {
    Preorder { stack: vec![root] }
}

/// Pre-order iterator over a description tree (node, then children in order).
#[derive(Debug)]
pub struct Preorder<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
