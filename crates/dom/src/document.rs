use crate::error::DomError;
use crate::node::Node;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

/// Index of a tree node (anything but an attribute) in its document's arena.
/// Ids are assigned in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The document node that contains the document element.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies any node of a document, attributes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Node(NodeId),
    /// The attribute at the given index of its owner element.
    Attribute(NodeId, usize),
}

impl NodeKey {
    /// The tree node itself, or the element owning the attribute.
    pub fn owner(self) -> NodeId {
        match self {
            NodeKey::Node(id) | NodeKey::Attribute(id, _) => id,
        }
    }

    fn order_key(self) -> (NodeId, usize) {
        match self {
            NodeKey::Node(id) => (id, 0),
            NodeKey::Attribute(id, idx) => (id, idx + 1),
        }
    }
}

impl From<NodeId> for NodeKey {
    fn from(id: NodeId) -> Self {
        NodeKey::Node(id)
    }
}

/// Document order: an element, then its attributes, then its children.
impl Ord for NodeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for NodeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A name resolved against the namespace declarations in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedName {
    namespace: Option<String>,
    local: String,
    prefix: Option<String>,
}

impl ExpandedName {
    pub fn new(namespace: Option<&str>, local: &str, prefix: Option<&str>) -> Self {
        ExpandedName {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The name as it appeared in the source, `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: ExpandedName,
    pub value: String,
}

/// A namespace binding. `prefix` is `None` for the default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: ExpandedName,
    /// Source order, names unique.
    pub attributes: Vec<Attribute>,
    /// Every binding in scope on this element, declared here or inherited.
    pub namespaces: Vec<Namespace>,
}

impl Element {
    /// Index of the attribute with the given expanded name.
    pub fn attribute_index(&self, namespace: Option<&str>, local: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name.is(namespace, local))
    }

    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attribute_index(namespace, local)
            .map(|i| self.attributes[i].value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable XML document stored as an arena in document order.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Parses XML text into an owned document.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let source = roxmltree::Document::parse(text)?;
        Ok(Self::from_roxmltree(&source))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Copies a borrowed `roxmltree` document into an owned arena.
    pub fn from_roxmltree(source: &roxmltree::Document<'_>) -> Self {
        let mut nodes: Vec<NodeData> = Vec::new();
        let mut ids: HashMap<roxmltree::NodeId, NodeId> = HashMap::new();

        // `descendants` walks in document order, so parents are always seen first.
        for rnode in source.root().descendants() {
            let id = NodeId(nodes.len() as u32);
            ids.insert(rnode.id(), id);
            let parent = rnode.parent().and_then(|p| ids.get(&p.id()).copied());
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(id);
            }
            nodes.push(NodeData {
                kind: convert_kind(rnode),
                parent,
                children: Vec::new(),
            });
        }

        if nodes.is_empty() {
            nodes.push(NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            });
        }
        Document { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The single top-level element, if the document has one.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        match key {
            NodeKey::Node(id) => id.index() < self.nodes.len(),
            NodeKey::Attribute(owner, idx) => self
                .element(owner)
                .is_some_and(|e| idx < e.attributes.len()),
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.index()).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn attribute(&self, owner: NodeId, idx: usize) -> Option<&Attribute> {
        self.element(owner).and_then(|e| e.attributes.get(idx))
    }

    /// Element children of `id` in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Element)> + '_ {
        self.children(id)
            .iter()
            .filter_map(move |&child| self.element(child).map(|e| (child, e)))
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Root | NodeKind::Element(_) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            _ => {}
        }
    }

    /// XPath string value of any node.
    pub fn string_value(&self, key: NodeKey) -> String {
        match key {
            NodeKey::Attribute(owner, idx) => self
                .attribute(owner, idx)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
            NodeKey::Node(id) => match self.kind(id) {
                NodeKind::Root | NodeKind::Element(_) => self.text_content(id),
                NodeKind::Text(text) | NodeKind::Comment(text) => text.clone(),
                NodeKind::ProcessingInstruction { value, .. } => value.clone().unwrap_or_default(),
            },
        }
    }

    /// A view of `key` whose upward navigation stops at `scope`.
    pub fn node(&self, scope: NodeId, key: NodeKey) -> Node<'_> {
        Node::new(self, scope, key)
    }

    /// True when `id` is `ancestor` or lies below it.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }
}

fn convert_kind(rnode: roxmltree::Node<'_, '_>) -> NodeKind {
    match rnode.node_type() {
        roxmltree::NodeType::Root => NodeKind::Root,
        roxmltree::NodeType::Element => {
            let tag = rnode.tag_name();
            let name = ExpandedName::new(
                tag.namespace(),
                tag.name(),
                tag.namespace().and_then(|uri| rnode.lookup_prefix(uri)),
            );
            let attributes = rnode
                .attributes()
                .map(|attr| {
                    let prefix = match attr.namespace() {
                        Some(crate::serialize::XML_NAMESPACE) => Some("xml"),
                        Some(uri) => rnode.lookup_prefix(uri),
                        None => None,
                    };
                    Attribute {
                        name: ExpandedName::new(attr.namespace(), attr.name(), prefix),
                        value: attr.value().to_string(),
                    }
                })
                .collect();
            let namespaces = rnode
                .namespaces()
                .filter(|ns| ns.name() != Some("xml"))
                .map(|ns| Namespace {
                    prefix: ns.name().map(str::to_string),
                    uri: ns.uri().to_string(),
                })
                .collect();
            NodeKind::Element(Element {
                name,
                attributes,
                namespaces,
            })
        }
        roxmltree::NodeType::Text => NodeKind::Text(rnode.text().unwrap_or_default().to_string()),
        roxmltree::NodeType::Comment => {
            NodeKind::Comment(rnode.text().unwrap_or_default().to_string())
        }
        roxmltree::NodeType::PI => {
            let (target, value) = rnode
                .pi()
                .map(|pi| (pi.target.to_string(), pi.value.map(str::to_string)))
                .unwrap_or_default();
            NodeKind::ProcessingInstruction { target, value }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS_XML: &str = r#"<?xml version="1.0"?>
<class xmlns="http://xml.phpdox.net/src" xmlns:x="urn:x" name="Service" full="App\Service">
  <!-- members -->
  <member name="a" x:flag="on"/>
  <plain xmlns="">text<b>bold</b></plain>
</class>"#;

    const SRC_NS: &str = "http://xml.phpdox.net/src";

    #[test]
    fn test_parse_assigns_document_order() {
        let doc = Document::parse(CLASS_XML).unwrap();
        let class = doc.root_element().unwrap();
        assert!(class > doc.root());
        let children = doc.children(class);
        assert!(children.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(doc.parent(class), Some(NodeId::ROOT));
    }

    #[test]
    fn test_expanded_names() {
        let doc = Document::parse(CLASS_XML).unwrap();
        let class = doc.root_element().unwrap();
        let element = doc.element(class).unwrap();
        assert!(element.name.is(Some(SRC_NS), "class"));
        assert_eq!(element.name.prefix(), None);
        assert_eq!(element.attribute(None, "full"), Some("App\\Service"));

        let (member_id, member) = doc.child_elements(class).next().unwrap();
        assert!(member.name.is(Some(SRC_NS), "member"));
        assert_eq!(member.attribute(Some("urn:x"), "flag"), Some("on"));
        assert_eq!(member.attributes[1].name.qualified(), "x:flag");
        assert!(doc.is_within(member_id, class));

        let (_, plain) = doc.child_elements(class).nth(1).unwrap();
        assert!(plain.name.is(None, "plain"));
    }

    #[test]
    fn test_in_scope_namespaces_exclude_xml() {
        let doc = Document::parse(CLASS_XML).unwrap();
        let class = doc.element(doc.root_element().unwrap()).unwrap();
        assert!(class.namespaces.iter().all(|ns| ns.prefix.as_deref() != Some("xml")));
        assert!(class.namespaces.iter().any(|ns| ns.prefix.as_deref() == Some("x")));
    }

    #[test]
    fn test_string_values() {
        let doc = Document::parse(CLASS_XML).unwrap();
        let class = doc.root_element().unwrap();
        let (plain, _) = doc.child_elements(class).nth(1).unwrap();
        assert_eq!(doc.text_content(plain), "textbold");
        assert_eq!(doc.string_value(NodeKey::Attribute(class, 0)), "Service");
    }

    #[test]
    fn test_key_order_puts_attributes_between_element_and_children() {
        let doc = Document::parse(CLASS_XML).unwrap();
        let class = doc.root_element().unwrap();
        let first_child = doc.children(class)[0];
        let mut keys = vec![
            NodeKey::Node(first_child),
            NodeKey::Attribute(class, 1),
            NodeKey::Node(class),
            NodeKey::Attribute(class, 0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                NodeKey::Node(class),
                NodeKey::Attribute(class, 0),
                NodeKey::Attribute(class, 1),
                NodeKey::Node(first_child),
            ]
        );
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Document::parse("<a><b></a>"), Err(DomError::Parse(_))));
    }
}
