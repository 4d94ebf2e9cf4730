//! Description-tree construction.
//!
//! `create_element` is the canonical entry point: it validates the tag and the
//! attribute keys once, wraps primitive children into text nodes, and returns
//! an immutable [`Element`]. Validation errors surface here and never reach the
//! reconciler.

use crate::types::{AttrValue, Attributes, CHILDREN_KEY, Element, TEXT_TAG};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    EmptyTag,
    MalformedTag(String),
    ReservedTag(String),
    ReservedAttribute(String),
    EmptyAttributeKey { tag: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyTag => f.write_str("invalid description: empty tag"),
            BuildError::MalformedTag(tag) => {
                write!(f, "invalid description: malformed tag {tag:?}")
            }
            BuildError::ReservedTag(tag) => {
                write!(f, "invalid description: tag {tag:?} is reserved")
            }
            BuildError::ReservedAttribute(key) => {
                write!(f, "invalid description: attribute {key:?} is reserved")
            }
            BuildError::EmptyAttributeKey { tag } => {
                write!(f, "invalid description: empty attribute key on <{tag}>")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// One child passed to the builder: a node, or a primitive that becomes text.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Node(Element),
    Primitive(AttrValue),
}

impl Child {
    fn into_element(self) -> Element {
        match self {
            Child::Node(element) => element,
            Child::Primitive(value) => Element::text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Child::Node(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Primitive(value.into())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Primitive(value.into())
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Primitive(value.into())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Primitive(value.into())
    }
}

impl From<u32> for Child {
    fn from(value: u32) -> Self {
        Child::Primitive(value.into())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Primitive(value.into())
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Primitive(value.into())
    }
}

pub fn create_element<I>(
    tag: &str,
    attributes: impl Into<Attributes>,
    children: I,
) -> Result<Element, BuildError>
where
    I: IntoIterator,
    I::Item: Into<Child>,
{
    validate_tag(tag)?;
    let attributes = attributes.into();
    validate_attributes(tag, &attributes)?;
    let children = children
        .into_iter()
        .map(|child| child.into().into_element())
        .collect();
    Ok(Element::from_parts(Arc::from(tag), attributes, children))
}

/// Text node; shorthand for a primitive child.
pub fn text(value: impl Into<AttrValue>) -> Element {
    Element::text(value)
}

/// Chained alternative to [`create_element`].
#[derive(Debug)]
pub struct ElementBuilder {
    tag: String,
    attributes: Attributes,
    children: Vec<Child>,
}

impl ElementBuilder {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<Arc<str>>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Element, BuildError> {
        create_element(&self.tag, self.attributes, self.children)
    }
}

impl Element {
    pub fn builder(tag: impl Into<String>) -> ElementBuilder {
        ElementBuilder::new(tag)
    }
}

fn validate_tag(tag: &str) -> Result<(), BuildError> {
    if tag.is_empty() {
        return Err(BuildError::EmptyTag);
    }
    if tag == TEXT_TAG || tag.starts_with('#') {
        return Err(BuildError::ReservedTag(tag.to_string()));
    }
    let malformed = tag
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '='));
    if malformed {
        return Err(BuildError::MalformedTag(tag.to_string()));
    }
    Ok(())
}

fn validate_attributes(tag: &str, attributes: &Attributes) -> Result<(), BuildError> {
    for (key, _) in attributes.iter() {
        if key.is_empty() {
            return Err(BuildError::EmptyAttributeKey {
                tag: tag.to_string(),
            });
        }
        if key == CHILDREN_KEY {
            return Err(BuildError::ReservedAttribute(key.to_string()));
        }
    }
    Ok(())
}
