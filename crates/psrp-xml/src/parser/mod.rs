//! Thin wrapper around `roxmltree` giving deserializers a `Node`/`Document`
//! vocabulary plus two visitor traits (context-free and, in downstream
//! crates, context-aware) for turning a parsed tree into typed values.

pub use roxmltree::{Attribute, Document, Error, Node, NodeType};

use crate::XmlError;

/// Parse a complete XML document. Errors are wrapped as [`XmlError::ParserError`].
pub fn parse(xml: &str) -> Result<Document<'_>, XmlError> {
    Document::parse(xml).map_err(XmlError::ParserError)
}

/// Visits one parsed XML node (and, recursively, its children) to build a
/// typed value. Implementors own the in-progress value as visitor state;
/// `finish` converts that state into `Value` or fails if required fields were
/// never visited.
pub trait XmlVisitor<'a> {
    type Value;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), XmlError>;

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), XmlError>;

    fn finish(self) -> Result<Self::Value, XmlError>;
}

/// A type that can be built from a single XML node via an [`XmlVisitor`].
pub trait XmlDeserialize<'a>: Sized {
    type Visitor: XmlVisitor<'a, Value = Self>;

    fn visitor() -> Self::Visitor;

    fn from_node(node: Node<'a, 'a>) -> Result<Self, XmlError> {
        let mut visitor = Self::visitor();
        visitor.visit_node(node)?;
        visitor.finish()
    }

    fn from_children(children: impl Iterator<Item = Node<'a, 'a>>) -> Result<Self, XmlError> {
        let mut visitor = Self::visitor();
        visitor.visit_children(children)?;
        visitor.finish()
    }
}

/// Drives a single [`XmlVisitor`] over one node. A thin convenience so
/// deserializer impls don't have to spell out `visit_node` + `finish` by hand.
pub struct NodeDeserializer<'a> {
    root: Node<'a, 'a>,
}

impl<'a> NodeDeserializer<'a> {
    pub fn new(root: Node<'a, 'a>) -> Self {
        Self { root }
    }

    pub fn deserialize<V>(self, mut visitor: V) -> Result<V::Value, XmlError>
    where
        V: XmlVisitor<'a>,
    {
        visitor.visit_node(self.root)?;
        visitor.finish()
    }
}

impl<'a> From<Node<'a, 'a>> for crate::builder::Element<'static> {
    /// Round-trips a parsed element back into a builder `Element`, ignoring
    /// comments/processing instructions. Useful when a message needs to
    /// re-embed an already-parsed fragment (e.g. CLIXML passed through
    /// unmodified inside a SOAP body).
    fn from(node: Node<'a, 'a>) -> Self {
        let mut element = crate::builder::Element::new(node.tag_name().name().to_string());

        for attr in node.attributes() {
            element = element.add_attribute(crate::builder::Attribute::new(
                Box::leak(attr.name().to_string().into_boxed_str()),
                attr.value().to_string(),
            ));
        }

        let mut children = Vec::new();
        let mut text = String::new();
        for child in node.children() {
            if child.is_element() {
                children.push(crate::builder::Element::from(child));
            } else if child.is_text()
                && let Some(t) = child.text()
            {
                text.push_str(t);
            }
        }

        if !children.is_empty() {
            element.add_children(children)
        } else if !text.is_empty() {
            element.set_text(text)
        } else {
            element
        }
    }
}
