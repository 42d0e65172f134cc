//! The read-only tree abstraction queries are evaluated against.
use std::hash::Hash;

/// A qualified name as written in the source, split into prefix and local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

/// The type of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// A node in a read-only, hierarchical data source.
///
/// Implementations must order nodes in document order through `Ord`: the
/// engine relies on it to return node sets sorted and free of duplicates.
/// An element sorts before its attributes, which sort before its children.
///
/// `'a` is the lifetime of the underlying tree.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    fn node_type(&self) -> NodeType;

    /// The name as written (`dox:class`). `None` for unnamed node types; the
    /// target for a processing instruction.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI the node's name is bound to, if any.
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The XPath string value: concatenated descendant text for elements and
    /// the root, the value for attributes, the content for everything else.
    fn string_value(&self) -> String;

    /// Attribute nodes, in source order. Empty for non-elements.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// Child nodes, in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// `None` at the top of the evaluation scope.
    fn parent(&self) -> Option<Self>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    #[derive(Debug)]
    struct MockData {
        node_type: NodeType,
        prefix: Option<&'static str>,
        local: &'static str,
        namespace: Option<&'static str>,
        value: String,
        parent: Option<usize>,
        children: Vec<usize>,
        attributes: Vec<usize>,
    }

    /// An arena tree built in document order, so ids double as order keys.
    #[derive(Debug)]
    pub struct MockTree {
        nodes: Vec<MockData>,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree,
    }

    impl PartialEq for MockNode<'_> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for MockNode<'_> {}

    impl PartialOrd for MockNode<'_> {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }
    impl Ord for MockNode<'_> {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl Hash for MockNode<'_> {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl MockTree {
        pub fn new() -> Self {
            MockTree {
                nodes: vec![MockData {
                    node_type: NodeType::Root,
                    prefix: None,
                    local: "",
                    namespace: None,
                    value: String::new(),
                    parent: None,
                    children: vec![],
                    attributes: vec![],
                }],
            }
        }

        fn push(&mut self, parent: usize, data: MockData, as_attribute: bool) -> usize {
            let id = self.nodes.len();
            self.nodes.push(data);
            if as_attribute {
                self.nodes[parent].attributes.push(id);
            } else {
                self.nodes[parent].children.push(id);
            }
            id
        }

        pub fn element(
            &mut self,
            parent: usize,
            prefix: Option<&'static str>,
            namespace: Option<&'static str>,
            local: &'static str,
        ) -> usize {
            let data = MockData {
                node_type: NodeType::Element,
                prefix,
                local,
                namespace,
                value: String::new(),
                parent: Some(parent),
                children: vec![],
                attributes: vec![],
            };
            self.push(parent, data, false)
        }

        pub fn attribute(&mut self, owner: usize, local: &'static str, value: &str) -> usize {
            let data = MockData {
                node_type: NodeType::Attribute,
                prefix: None,
                local,
                namespace: None,
                value: value.to_string(),
                parent: Some(owner),
                children: vec![],
                attributes: vec![],
            };
            self.push(owner, data, true)
        }

        pub fn text(&mut self, parent: usize, value: &str) -> usize {
            let data = MockData {
                node_type: NodeType::Text,
                prefix: None,
                local: "",
                namespace: None,
                value: value.to_string(),
                parent: Some(parent),
                children: vec![],
                attributes: vec![],
            };
            self.push(parent, data, false)
        }

        pub fn node(&self, id: usize) -> MockNode<'_> {
            MockNode { id, tree: self }
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.tree.nodes[self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            let data = &self.tree.nodes[self.id];
            match data.node_type {
                NodeType::Element | NodeType::Attribute => Some(QName {
                    prefix: data.prefix,
                    local_part: data.local,
                }),
                _ => None,
            }
        }

        fn namespace_uri(&self) -> Option<&'a str> {
            self.tree.nodes[self.id].namespace
        }

        fn string_value(&self) -> String {
            let data = &self.tree.nodes[self.id];
            match data.node_type {
                NodeType::Root | NodeType::Element => data
                    .children
                    .iter()
                    .map(|&c| self.tree.node(c).string_value())
                    .collect(),
                _ => data.value.clone(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(tree.nodes[self.id].attributes.iter().map(move |&id| MockNode { id, tree }))
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(tree.nodes[self.id].children.iter().map(move |&id| MockNode { id, tree }))
        }

        fn parent(&self) -> Option<Self> {
            self.tree.nodes[self.id].parent.map(|id| MockNode { id, tree: self.tree })
        }
    }

    pub const DOX_NS: &str = "urn:dox";

    /// ```text
    /// 0  (root)
    /// 1  <dox:class name="Foo" full="App\Foo">        2 @name, 3 @full
    /// 4    <dox:method name="a" visibility="public">  5 @name, 6 @visibility
    /// 7      <dox:docblock>Does a</dox:docblock>      8 text
    /// 9    <dox:method name="b" visibility="private"> 10 @name, 11 @visibility
    /// 12   <method name="plain"/>                     13 @name
    /// 14   tail                                       (text)
    /// ```
    pub fn class_tree() -> MockTree {
        let mut t = MockTree::new();
        let class = t.element(0, Some("dox"), Some(DOX_NS), "class");
        t.attribute(class, "name", "Foo");
        t.attribute(class, "full", "App\\Foo");
        let a = t.element(class, Some("dox"), Some(DOX_NS), "method");
        t.attribute(a, "name", "a");
        t.attribute(a, "visibility", "public");
        let doc = t.element(a, Some("dox"), Some(DOX_NS), "docblock");
        t.text(doc, "Does a");
        let b = t.element(class, Some("dox"), Some(DOX_NS), "method");
        t.attribute(b, "name", "b");
        t.attribute(b, "visibility", "private");
        let plain = t.element(class, None, None, "method");
        t.attribute(plain, "name", "plain");
        t.text(class, "tail");
        t
    }
}
