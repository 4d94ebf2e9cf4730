use std::fmt;
use std::sync::Arc;

/// Tag carried by description nodes that stand for a text node.
pub const TEXT_TAG: &str = "TEXT";
/// Attribute holding the content of a text node.
pub const TEXT_VALUE_KEY: &str = "value";
/// Attribute key reserved for the child list; never stored in `Attributes`.
pub const CHILDREN_KEY: &str = "children";
/// Tag of the synthetic node the engine places above a render root.
pub const CONTAINER_TAG: &str = "#container";

/// Primitive attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Str(Arc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Equality used for diffing. Floats compare by bit pattern, so an
    /// unchanged `NaN` is not reported as a change.
    pub fn same_as(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Float(a), AttrValue::Float(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) if v.is_nan() => f.write_str("NaN"),
            AttrValue::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(Arc::from(value))
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(Arc::from(value))
    }
}

impl From<Arc<str>> for AttrValue {
    fn from(value: Arc<str>) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Ordered attribute mapping.
///
/// Insertion order is preserved; inserting an existing key replaces its value
/// in place. The reserved `children` key is rejected by the builder, not here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(Arc<str>, AttrValue)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, key: impl Into<Arc<str>>, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<Arc<str>>,
        value: impl Into<AttrValue>,
    ) -> Option<AttrValue> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let pos = self.entries.iter().position(|(k, _)| &**k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    /// Minimal change set turning `old` into `new`.
    ///
    /// Removals come first, then sets for keys that are new or whose value
    /// changed. Lazily evaluated; does not allocate.
    pub fn diff<'a>(old: &'a Attributes, new: &'a Attributes) -> AttrDiff<'a> {
        AttrDiff {
            old,
            new,
            old_pos: 0,
            new_pos: 0,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<Arc<str>>,
    V: Into<AttrValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Attributes
where
    K: Into<Arc<str>>,
    V: Into<AttrValue>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttrChange<'a> {
    Remove { key: &'a str },
    Set { key: &'a str, value: &'a AttrValue },
}

/// Iterator returned by [`Attributes::diff`].
#[derive(Debug)]
pub struct AttrDiff<'a> {
    old: &'a Attributes,
    new: &'a Attributes,
    old_pos: usize,
    new_pos: usize,
}

impl<'a> Iterator for AttrDiff<'a> {
    type Item = AttrChange<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((key, _)) = self.old.entries.get(self.old_pos) {
            self.old_pos += 1;
            if !self.new.contains_key(key) {
                return Some(AttrChange::Remove { key });
            }
        }
        while let Some((key, value)) = self.new.entries.get(self.new_pos) {
            self.new_pos += 1;
            if !self.old.get(key).is_some_and(|old| old.same_as(value)) {
                return Some(AttrChange::Set { key, value });
            }
        }
        None
    }
}

/// Immutable description node.
///
/// Cheap to clone: the tag, attributes and children live behind one shared
/// allocation and are never mutated after construction.
#[derive(Clone, PartialEq)]
pub struct Element(Arc<ElementData>);

#[derive(Debug, PartialEq)]
struct ElementData {
    tag: Arc<str>,
    attributes: Attributes,
    children: Vec<Element>,
}

impl Element {
    pub(crate) fn from_parts(tag: Arc<str>, attributes: Attributes, children: Vec<Element>) -> Self {
        Element(Arc::new(ElementData {
            tag,
            attributes,
            children,
        }))
    }

    /// Text node holding the stringified `value`.
    pub fn text(value: impl Into<AttrValue>) -> Self {
        let value = value.into();
        let value = match value {
            AttrValue::Str(s) => AttrValue::Str(s),
            other => AttrValue::Str(Arc::from(other.to_string())),
        };
        Element::from_parts(
            Arc::from(TEXT_TAG),
            Attributes::new().with(TEXT_VALUE_KEY, value),
            Vec::new(),
        )
    }

    /// Synthetic node wrapping a render root under a container.
    pub fn container(root: Element) -> Self {
        Element::from_parts(Arc::from(CONTAINER_TAG), Attributes::new(), vec![root])
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn tag_arc(&self) -> Arc<str> {
        Arc::clone(&self.0.tag)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.0.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.0.children
    }

    pub fn is_text(&self) -> bool {
        &*self.0.tag == TEXT_TAG
    }

    pub fn text_value(&self) -> Option<&AttrValue> {
        if self.is_text() {
            self.0.attributes.get(TEXT_VALUE_KEY)
        } else {
            None
        }
    }

    pub fn ptr_eq(a: &Element, b: &Element) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.text_value() {
            return write!(f, "{value:?}");
        }
        let mut s = f.debug_struct("Element");
        s.field("tag", &self.0.tag);
        if !self.0.attributes.is_empty() {
            s.field("attributes", &self.0.attributes);
        }
        if !self.0.children.is_empty() {
            s.field("children", &self.0.children);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut attrs = Attributes::from([("id", "a"), ("class", "x")]);
        let old = attrs.insert("id", "b");
        assert_eq!(old, Some(AttrValue::from("a")));
        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["id", "class"]);
        assert_eq!(attrs.get("id"), Some(&AttrValue::from("b")));
    }

    #[test]
    fn diff_removes_then_sets_changed_keys() {
        let old = Attributes::from([("id", "a"), ("title", "t"), ("class", "x")]);
        let new = Attributes::from([("class", "x"), ("id", "b"), ("lang", "en")]);
        let changes: Vec<_> = Attributes::diff(&old, &new).collect();
        assert_eq!(
            changes,
            vec![
                AttrChange::Remove { key: "title" },
                AttrChange::Set {
                    key: "id",
                    value: &AttrValue::from("b")
                },
                AttrChange::Set {
                    key: "lang",
                    value: &AttrValue::from("en")
                },
            ]
        );
    }

    #[test]
    fn diff_of_equal_attributes_is_empty() {
        let attrs = Attributes::from([("id", AttrValue::from("a")), ("n", AttrValue::Int(3))]);
        assert_eq!(Attributes::diff(&attrs, &attrs.clone()).count(), 0);
    }

    #[test]
    fn unchanged_nan_is_not_a_change() {
        let old = Attributes::from([("opacity", f64::NAN), ("scale", 1.0)]);
        let new = Attributes::from([("opacity", f64::NAN), ("scale", 2.0)]);
        let changes: Vec<_> = Attributes::diff(&old, &new).collect();
        assert_eq!(
            changes,
            vec![AttrChange::Set {
                key: "scale",
                value: &AttrValue::Float(2.0)
            }]
        );
        assert_eq!(Attributes::diff(&old, &old.clone()).count(), 0);
    }

    #[test]
    fn text_values_are_stringified() {
        assert_eq!(
            Element::text(42i64).text_value(),
            Some(&AttrValue::from("42"))
        );
        assert_eq!(
            Element::text(1.5f64).text_value(),
            Some(&AttrValue::from("1.5"))
        );
        assert_eq!(
            Element::text(2.0f64).text_value(),
            Some(&AttrValue::from("2"))
        );
        assert_eq!(
            Element::text(true).text_value(),
            Some(&AttrValue::from("true"))
        );
        assert!(Element::text("x").children().is_empty());
    }

    #[test]
    fn container_wraps_single_root() {
        let root = Element::text("a");
        let container = Element::container(root.clone());
        assert_eq!(container.tag(), CONTAINER_TAG);
        assert_eq!(container.children().len(), 1);
        assert!(Element::ptr_eq(&container.children()[0], &root));
    }
}
