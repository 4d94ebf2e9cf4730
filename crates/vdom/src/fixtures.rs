//! Deterministic description trees for tests, benches and fuzzing.

use crate::types::{Attributes, Element};
use std::sync::Arc;

/// Node count of a full tree with `breadth` children per inner node.
pub fn expected_node_count(depth: u32, breadth: usize) -> usize {
    match breadth {
        0 => return 1,
        1 => return depth as usize + 1,
        _ => {}
    }
    (breadth.pow(depth + 1) - 1) / (breadth - 1)
}

/// Full tree: inner nodes are `div`s, the deepest level is `span`s.
///
/// Every node carries a `data-path` attribute naming its position, so two
/// calls with the same shape produce equal trees.
pub fn balanced_tree(depth: u32, breadth: usize) -> Element {
    build_level(depth, breadth, "0".to_string())
}

fn build_level(remaining: u32, breadth: usize, path: String) -> Element {
    if remaining == 0 {
        return Element::from_parts(
            Arc::from("span"),
            Attributes::new().with("data-path", path),
            Vec::new(),
        );
    }
    let children = (0..breadth)
        .map(|i| build_level(remaining - 1, breadth, format!("{path}.{i}")))
        .collect();
    Element::from_parts(
        Arc::from("div"),
        Attributes::new().with("data-path", path),
        children,
    )
}

/// `ul` with `items` text-bearing `li` children.
pub fn wide_list(items: usize, label: &str) -> Element {
    let children = (0..items)
        .map(|i| {
            Element::from_parts(
                Arc::from("li"),
                Attributes::new().with("data-index", i as i64),
                vec![Element::text(format!("{label} {i}"))],
            )
        })
        .collect();
    Element::from_parts(Arc::from("ul"), Attributes::new(), children)
}
