//! A copyable view of one node, implementing `DataSourceNode`.

use crate::document::{Attribute, Document, Element, NodeId, NodeKey, NodeKind};
use crate::error::DomError;
use doxweave_xpath::{DataSourceNode, NodeType, QName};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

/// A node of a [`Document`] seen from within a scope.
///
/// The scope node acts as the top of the tree: its `parent()` is `None`, so
/// upward navigation from anywhere below it stops there, as if the subtree
/// were a standalone document.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    scope: NodeId,
    key: NodeKey,
}

impl<'a> Node<'a> {
    pub(crate) fn new(doc: &'a Document, scope: NodeId, key: NodeKey) -> Self {
        Node { doc, scope, key }
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn scope(&self) -> NodeId {
        self.scope
    }

    pub fn is_element(&self) -> bool {
        self.element().is_some()
    }

    pub fn element(&self) -> Option<&'a Element> {
        match self.key {
            NodeKey::Node(id) => self.doc.element(id),
            NodeKey::Attribute(..) => None,
        }
    }

    pub fn attribute(&self) -> Option<&'a Attribute> {
        match self.key {
            NodeKey::Attribute(owner, idx) => self.doc.attribute(owner, idx),
            NodeKey::Node(_) => None,
        }
    }

    /// Serializes this node and everything below it.
    pub fn to_xml_string(&self) -> Result<String, DomError> {
        crate::serialize::to_xml_string(self.doc, self.key)
    }

    fn with_key(&self, key: NodeKey) -> Self {
        Node { key, ..*self }
    }
}

impl Debug for Node<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.element(), self.attribute()) {
            (Some(element), _) => write!(f, "<{}> {:?}", element.name.qualified(), self.key),
            (_, Some(attr)) => write!(f, "@{} {:?}", attr.name.qualified(), self.key),
            _ => write!(f, "{:?}", self.key),
        }
    }
}

// Identity is the key alone: views are only ever compared within one document.
impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for Node<'_> {}

impl PartialOrd for Node<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for Node<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<'a> DataSourceNode<'a> for Node<'a> {
    fn node_type(&self) -> NodeType {
        match self.key {
            NodeKey::Attribute(..) => NodeType::Attribute,
            NodeKey::Node(id) => match self.doc.kind(id) {
                NodeKind::Root => NodeType::Root,
                NodeKind::Element(_) => NodeType::Element,
                NodeKind::Text(_) => NodeType::Text,
                NodeKind::Comment(_) => NodeType::Comment,
                NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            },
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        let doc = self.doc;
        match self.key {
            NodeKey::Attribute(owner, idx) => doc.attribute(owner, idx).map(|a| QName {
                prefix: a.name.prefix(),
                local_part: a.name.local(),
            }),
            NodeKey::Node(id) => match doc.kind(id) {
                NodeKind::Element(e) => Some(QName {
                    prefix: e.name.prefix(),
                    local_part: e.name.local(),
                }),
                NodeKind::ProcessingInstruction { target, .. } => Some(QName {
                    prefix: None,
                    local_part: target,
                }),
                _ => None,
            },
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        match (self.element(), self.attribute()) {
            (Some(element), _) => element.name.namespace(),
            (_, Some(attr)) => attr.name.namespace(),
            _ => None,
        }
    }

    fn string_value(&self) -> String {
        self.doc.string_value(self.key)
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let node = *self;
        match (self.key, self.element()) {
            (NodeKey::Node(id), Some(element)) => Box::new(
                (0..element.attributes.len()).map(move |idx| node.with_key(NodeKey::Attribute(id, idx))),
            ),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let node = *self;
        let doc = self.doc;
        match self.key {
            NodeKey::Node(id) => Box::new(
                doc.children(id)
                    .iter()
                    // Whitespace-only text between elements is formatting, not content.
                    .filter(move |&&child| match doc.kind(child) {
                        NodeKind::Text(text) => !text.trim().is_empty(),
                        _ => true,
                    })
                    .map(move |&child| node.with_key(NodeKey::Node(child))),
            ),
            NodeKey::Attribute(..) => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self.key {
            NodeKey::Node(id) if id == self.scope => None,
            NodeKey::Node(id) => self.doc.parent(id).map(|p| self.with_key(NodeKey::Node(p))),
            NodeKey::Attribute(owner, _) => Some(self.with_key(NodeKey::Node(owner))),
        }
    }
}
