use crate::types::{AttrValue, Element};
use std::fmt::{self, Write};

/// Deterministic serialization of description forests for test comparisons.
/// Not a stable format.
///
/// Equivalence rules:
/// - Tags must match.
/// - Text nodes must match exactly.
/// - Attribute names and values must match; order only counts when
///   `sort_attributes` is off.
/// - Child order is significant.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotOptions {
    pub sort_attributes: bool,
    pub indent: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            sort_attributes: true,
            indent: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    lines: Vec<String>,
}

impl Snapshot {
    pub fn new(roots: &[Element], options: SnapshotOptions) -> Self {
        let mut lines = Vec::new();
        let mut stack: Vec<(&Element, usize)> = roots.iter().rev().map(|r| (r, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            lines.push(node_line(node, depth, &options));
            stack.extend(node.children().iter().rev().map(|c| (c, depth + 1)));
        }
        Self { lines }
    }

    pub fn of(root: &Element) -> Self {
        Self::new(std::slice::from_ref(root), SnapshotOptions::default())
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SnapshotMismatch {
    pub line: usize,
    pub expected: Snapshot,
    pub actual: Snapshot,
}

impl fmt::Display for SnapshotMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = self.expected.lines.get(self.line).map_or("<end>", String::as_str);
        let actual = self.actual.lines.get(self.line).map_or("<end>", String::as_str);
        writeln!(f, "tree mismatch at line {}", self.line + 1)?;
        writeln!(f, "expected: {expected}")?;
        writeln!(f, "actual:   {actual}")?;
        writeln!(f, "expected tree:\n{}", self.expected)?;
        writeln!(f, "actual tree:\n{}", self.actual)?;
        Ok(())
    }
}

impl std::error::Error for SnapshotMismatch {}

pub fn compare_trees(
    expected: &[Element],
    actual: &[Element],
    options: SnapshotOptions,
) -> Result<(), Box<SnapshotMismatch>> {
    let expected = Snapshot::new(expected, options);
    let actual = Snapshot::new(actual, options);
    let first_diff = expected
        .lines
        .iter()
        .zip(actual.lines.iter())
        .position(|(e, a)| e != a)
        .or_else(|| {
            (expected.lines.len() != actual.lines.len())
                .then(|| expected.lines.len().min(actual.lines.len()))
        });
    match first_diff {
        None => Ok(()),
        Some(line) => Err(Box::new(SnapshotMismatch {
            line,
            expected,
            actual,
        })),
    }
}

pub fn assert_trees_eq(expected: &[Element], actual: &[Element]) {
    if let Err(mismatch) = compare_trees(expected, actual, SnapshotOptions::default()) {
        panic!("{mismatch}");
    }
}

fn node_line(node: &Element, depth: usize, options: &SnapshotOptions) -> String {
    let mut line = " ".repeat(depth * options.indent);
    if let Some(value) = node.text_value() {
        let _ = write!(line, "{:?}", value.to_string());
        return line;
    }
    line.push('<');
    line.push_str(node.tag());
    let mut attrs: Vec<(&str, &AttrValue)> = node.attributes().iter().collect();
    if options.sort_attributes {
        attrs.sort_by(|a, b| a.0.cmp(b.0));
    }
    for (key, value) in attrs {
        let _ = write!(line, " {key}={:?}", value.to_string());
    }
    line.push('>');
    line
}
