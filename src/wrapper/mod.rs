//! Read-only, name-addressable handles over XML node sets.
//!
//! An [`XmlWrapper`] lets a template walk an XML document with bare names:
//! `wrapper.get("name")` means "attribute `name`, else child `dox:name`, else
//! any child `name`" (see [`resolve`]). Every lookup returns a fresh wrapper,
//! so navigation is always root-down and no wrapper refers back to another.

pub mod query;
pub mod resolve;

use crate::error::WrapperError;
use doxweave_dom::{Document, Node, NodeId, NodeKey};
use doxweave_xpath::{DataSourceNode, EvaluationContext, evaluate};
use once_cell::sync::OnceCell;
use query::QueryContext;
use resolve::ResolutionContext;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The prefix the canonical namespace is bound to in queries.
pub const DOX_PREFIX: &str = "dox";
/// Namespace of the documentation model produced by the collector.
pub const SRC_NAMESPACE: &str = "http://xml.phpdox.net/src";
/// Namespace of the project configuration.
pub const CONFIG_NAMESPACE: &str = "http://xml.phpdox.net/config";

/// How to address a wrapper: by bare name through the resolution policy, or
/// by position in the node set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    Name(Cow<'a, str>),
    Index(usize),
}

impl<'a> From<&'a str> for Lookup<'a> {
    fn from(name: &'a str) -> Self {
        Lookup::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Lookup<'_> {
    fn from(name: String) -> Self {
        Lookup::Name(Cow::Owned(name))
    }
}

impl From<usize> for Lookup<'_> {
    fn from(index: usize) -> Self {
        Lookup::Index(index)
    }
}

/// State shared by a wrapper and all wrappers derived from it.
struct Shared {
    resolution: ResolutionContext,
    query: OnceCell<QueryContext>,
}

/// A read-only view of an ordered set of nodes from one document.
#[derive(Clone)]
pub struct XmlWrapper {
    doc: Arc<Document>,
    /// Top of the tree as seen by this wrapper's nodes.
    scope: NodeId,
    nodes: Vec<NodeKey>,
    shared: Arc<Shared>,
}

impl XmlWrapper {
    /// Wraps nodes of `doc` with already resolved prefix bindings. The
    /// namespace bound to [`DOX_PREFIX`] becomes the canonical one; without
    /// such a binding [`DOX_PREFIX`] is bound to [`SRC_NAMESPACE`].
    /// Keys that do not belong to `doc` are dropped.
    pub fn from_node_set(doc: Arc<Document>, mut nodes: Vec<NodeKey>, mut bindings: HashMap<String, String>) -> Self {
        nodes.retain(|&key| doc.contains(key));
        let canonical = bindings
            .entry(DOX_PREFIX.to_string())
            .or_insert_with(|| SRC_NAMESPACE.to_string())
            .clone();
        XmlWrapper {
            doc,
            scope: NodeId::ROOT,
            nodes,
            shared: Self::shared(ResolutionContext::new(bindings, Some(canonical))),
        }
    }

    /// Wraps a single node as if it were the root of its own document, with
    /// `namespace_uri` bound to [`DOX_PREFIX`].
    ///
    /// The arena is shared with the source document rather than copied; the
    /// node's scope is cut at the node itself, so `..`, ancestors and
    /// absolute paths never reach outside it.
    pub fn from_single_node(doc: Arc<Document>, node: NodeKey, namespace_uri: &str) -> Self {
        let bindings = HashMap::from([(DOX_PREFIX.to_string(), namespace_uri.to_string())]);
        let resolution = ResolutionContext::new(bindings, Some(namespace_uri.to_string()));
        let nodes = if doc.contains(node) { vec![node] } else { Vec::new() };
        XmlWrapper {
            scope: node.owner(),
            doc,
            nodes,
            shared: Self::shared(resolution),
        }
    }

    /// Wraps the document element, or nothing for a document without one.
    pub fn from_document(doc: Arc<Document>, namespace_uri: &str) -> Self {
        match doc.root_element() {
            Some(root) => Self::from_single_node(doc, NodeKey::Node(root), namespace_uri),
            None => {
                let mut empty = Self::from_single_node(doc, NodeKey::Node(NodeId::ROOT), namespace_uri);
                empty.nodes.clear();
                empty
            }
        }
    }

    fn shared(resolution: ResolutionContext) -> Arc<Shared> {
        Arc::new(Shared {
            resolution,
            query: OnceCell::new(),
        })
    }

    /// A wrapper over other nodes of the same document, in the same scope.
    fn derive(&self, nodes: Vec<NodeKey>) -> Self {
        XmlWrapper {
            doc: Arc::clone(&self.doc),
            scope: self.scope,
            nodes,
            shared: Arc::clone(&self.shared),
        }
    }

    /// A detached single-node wrapper that keeps this wrapper's bindings.
    fn detach(&self, key: NodeKey) -> Self {
        XmlWrapper {
            doc: Arc::clone(&self.doc),
            scope: key.owner(),
            nodes: vec![key],
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.nodes
    }

    pub fn bindings(&self) -> &HashMap<String, String> {
        self.shared.resolution.bindings()
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn first(&self) -> Option<NodeKey> {
        self.nodes.first().copied()
    }

    /// By name: the resolution policy applied to the first node. By index:
    /// the node at that position, detached. `None` when nothing matches.
    pub fn get<'n>(&self, lookup: impl Into<Lookup<'n>>) -> Option<XmlWrapper> {
        match lookup.into() {
            Lookup::Index(i) => self.nodes.get(i).map(|&key| self.detach(key)),
            Lookup::Name(name) => {
                let first = self.first()?;
                let found = resolve::resolve(&self.doc, first, &name, &self.shared.resolution);
                (!found.is_empty()).then(|| self.derive(found))
            }
        }
    }

    /// Whether `get` would find something, without building a wrapper.
    pub fn exists<'n>(&self, lookup: impl Into<Lookup<'n>>) -> bool {
        match lookup.into() {
            Lookup::Index(i) => i < self.nodes.len(),
            Lookup::Name(name) => self.first().is_some_and(|first| {
                resolve::resolve_tier(&self.doc, first, &name, &self.shared.resolution).is_some()
            }),
        }
    }

    /// Evaluates a path relative to the first node. Unanchored paths are
    /// anchored first, so `dox:member` and `/dox:member` both mean
    /// `./dox:member`. `Ok(None)` when nothing matches.
    pub fn query(&self, path: &str) -> Result<Option<XmlWrapper>, WrapperError> {
        let Some(first) = self.first() else {
            return Ok(None);
        };
        let ctx = self.shared.query.get_or_init(QueryContext::new);
        let expr = ctx.compile(path)?;

        let e_ctx = EvaluationContext::new(
            self.doc.node(self.scope, first),
            self.doc.node(self.scope, NodeKey::Node(self.scope)),
            &ctx.functions,
            self.shared.resolution.bindings(),
        );
        let to_query_error = |source| WrapperError::Query {
            query: path.to_string(),
            source,
        };
        let nodes = evaluate(&expr, &e_ctx)
            .and_then(|value| value.into_node_set())
            .map_err(to_query_error)?;

        if nodes.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.derive(nodes.iter().map(|n| n.key()).collect())))
    }

    /// The string value of the first node: an attribute's value or an
    /// element's concatenated descendant text. Empty for an empty set.
    pub fn as_text(&self) -> String {
        self.first()
            .map(|key| self.doc.string_value(key))
            .unwrap_or_default()
    }

    pub fn as_raw_node(&self) -> Option<Node<'_>> {
        self.first().map(|key| self.doc.node(self.scope, key))
    }

    pub fn as_raw_list(&self) -> Vec<Node<'_>> {
        self.nodes
            .iter()
            .map(|&key| self.doc.node(self.scope, key))
            .collect()
    }

    /// The first node serialized as XML, or an empty string.
    pub fn as_xml_string(&self) -> Result<String, WrapperError> {
        match self.as_raw_node() {
            Some(node) => Ok(node.to_xml_string()?),
            None => Ok(String::new()),
        }
    }

    /// One detached single-node wrapper per node, in document order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            wrapper: self,
            position: 0,
        }
    }

    pub fn set<'n>(&self, _lookup: impl Into<Lookup<'n>>, _value: XmlWrapper) -> Result<(), WrapperError> {
        Err(WrapperError::Immutable("set"))
    }

    pub fn delete<'n>(&self, _lookup: impl Into<Lookup<'n>>) -> Result<(), WrapperError> {
        Err(WrapperError::Immutable("deleted"))
    }

    /// Local name of the first node, if it has one.
    pub fn name(&self) -> Option<String> {
        self.as_raw_node()
            .and_then(|n| n.name())
            .map(|q| q.local_part.to_string())
    }
}

impl fmt::Display for XmlWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl fmt::Debug for XmlWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlWrapper")
            .field("scope", &self.scope)
            .field("nodes", &self.nodes)
            .field("bindings", self.shared.resolution.bindings())
            .finish()
    }
}

pub struct Iter<'w> {
    wrapper: &'w XmlWrapper,
    position: usize,
}

impl Iterator for Iter<'_> {
    type Item = XmlWrapper;

    fn next(&mut self) -> Option<XmlWrapper> {
        let key = *self.wrapper.nodes.get(self.position)?;
        self.position += 1;
        Some(self.wrapper.detach(key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.wrapper.nodes.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'w> IntoIterator for &'w XmlWrapper {
    type Item = XmlWrapper;
    type IntoIter = Iter<'w>;

    fn into_iter(self) -> Iter<'w> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS_XML: &str = r#"<class xmlns="http://xml.phpdox.net/src" name="Service" full="App\Service">
  <docblock><description compact="Does things."/></docblock>
  <method name="run" visibility="public"><docblock><return type="void"/></docblock></method>
  <method name="stop" visibility="private"/>
  <extra>plain</extra>
</class>"#;

    fn class_wrapper() -> XmlWrapper {
        let doc = Arc::new(Document::parse(CLASS_XML).unwrap());
        XmlWrapper::from_document(doc, SRC_NAMESPACE)
    }

    fn empty_wrapper() -> XmlWrapper {
        let doc = Arc::new(Document::parse("<root/>").unwrap());
        XmlWrapper::from_node_set(doc, vec![], HashMap::new())
    }

    #[test]
    fn test_get_by_name_and_index() {
        let class = class_wrapper();
        assert_eq!(class.count(), 1);
        assert_eq!(class.get("full").unwrap().as_text(), "App\\Service");

        let methods = class.get("method").unwrap();
        assert_eq!(methods.count(), 2);
        assert_eq!(methods.get(1usize).unwrap().get("name").unwrap().as_text(), "stop");
        assert!(methods.get(2usize).is_none());
    }

    #[test]
    fn test_name_lookup_uses_first_node() {
        let methods = class_wrapper().get("method").unwrap();
        assert_eq!(methods.get("name").unwrap().as_text(), "run");
    }

    #[test]
    fn test_chained_lookup() {
        let class = class_wrapper();
        let compact = class
            .get("docblock")
            .and_then(|d| d.get("description"))
            .and_then(|d| d.get("compact"))
            .unwrap();
        assert_eq!(compact.to_string(), "Does things.");
    }

    #[test]
    fn test_empty_wrapper_never_fails() {
        let empty = empty_wrapper();
        assert_eq!(empty.count(), 0);
        assert!(empty.get("anything").is_none());
        assert!(empty.get(0usize).is_none());
        assert!(!empty.exists("anything"));
        assert_eq!(empty.as_text(), "");
        assert_eq!(empty.as_xml_string().unwrap(), "");
        assert!(empty.query("foo").unwrap().is_none());
        assert_eq!(empty.iter().count(), 0);
    }

    #[test]
    fn test_exists_matches_get() {
        let class = class_wrapper();
        for name in ["name", "method", "extra", "docblock", "missing", "Method"] {
            assert_eq!(class.exists(name), class.get(name).is_some(), "{}", name);
        }
        assert!(class.exists(0usize));
        assert!(!class.exists(1usize));
    }

    #[test]
    fn test_repeated_lookup_is_stable() {
        let class = class_wrapper();
        let a = class.get("method").unwrap();
        let b = class.get("method").unwrap();
        assert_eq!(a.keys(), b.keys());
    }

    #[test]
    fn test_iteration_yields_detached_wrappers_in_order() {
        let methods = class_wrapper().get("method").unwrap();
        let names: Vec<String> = methods
            .iter()
            .map(|m| m.get("name").unwrap().as_text())
            .collect();
        assert_eq!(names, vec!["run", "stop"]);

        for method in &methods {
            assert_eq!(method.count(), 1);
            assert!(method.query("..").unwrap().is_none());
        }
        // restartable
        assert_eq!(methods.iter().len(), 2);
        assert_eq!(methods.iter().count(), 2);
    }

    #[test]
    fn test_query_is_anchored_to_first_node() {
        let class = class_wrapper();
        let names = class.query("dox:method/@name").unwrap().unwrap();
        assert_eq!(names.count(), 2);
        let texts: Vec<String> = names.iter().map(|n| n.as_text()).collect();
        assert_eq!(texts, vec!["run", "stop"]);

        let returns = class.query("//dox:return/@type").unwrap().unwrap();
        assert_eq!(returns.as_text(), "void");

        assert!(class.query("dox:nothing").unwrap().is_none());
    }

    #[test]
    fn test_query_errors() {
        let class = class_wrapper();
        assert!(matches!(class.query("dox:method["), Err(WrapperError::Query { .. })));
        assert!(matches!(class.query("count(dox:method)"), Err(WrapperError::Query { .. })));
        assert!(matches!(class.query("php:method"), Err(WrapperError::Query { .. })));
    }

    #[test]
    fn test_query_results_stay_in_scope() {
        let class = class_wrapper();
        let first_method = class.get("method").unwrap().get(0usize).unwrap();
        // Detached: the class element is out of reach.
        assert!(first_method.query("ancestor::dox:class").unwrap().is_none());
        let docblock = first_method.query("dox:docblock").unwrap().unwrap();
        assert_eq!(docblock.query("../@name").unwrap().unwrap().as_text(), "run");
    }

    #[test]
    fn test_xml_string() {
        let class = class_wrapper();
        let method = class.get("method").unwrap().get(1usize).unwrap();
        assert_eq!(
            method.as_xml_string().unwrap(),
            r#"<method xmlns="http://xml.phpdox.net/src" name="stop" visibility="private"/>"#
        );
        assert_eq!(class.get("name").unwrap().as_xml_string().unwrap(), r#"name="Service""#);
    }

    #[test]
    fn test_raw_access() {
        let methods = class_wrapper().get("method").unwrap();
        assert_eq!(methods.as_raw_list().len(), 2);
        assert!(methods.as_raw_node().unwrap().is_element());
        assert_eq!(methods.name().as_deref(), Some("method"));
    }

    #[test]
    fn test_mutation_is_rejected() {
        let class = class_wrapper();
        let other = class.clone();
        assert!(matches!(class.set("name", other), Err(WrapperError::Immutable(_))));
        assert!(matches!(class.delete(0usize), Err(WrapperError::Immutable(_))));
        assert_eq!(class.get("name").unwrap().as_text(), "Service");
    }

    #[test]
    fn test_foreign_keys_are_dropped() {
        let doc = Arc::new(Document::parse("<root/>").unwrap());
        let wrapper = XmlWrapper::from_node_set(doc, vec![NodeKey::Node(NodeId::ROOT), NodeKey::Attribute(NodeId::ROOT, 3)], HashMap::new());
        assert_eq!(wrapper.count(), 1);
    }

    #[test]
    fn test_node_set_without_bindings_prefers_documentation_namespace() {
        let doc = Arc::new(
            Document::parse(r#"<root xmlns:d="http://xml.phpdox.net/src"><x>2</x><d:x>1</d:x></root>"#).unwrap(),
        );
        let root = NodeKey::Node(doc.root_element().unwrap());
        let wrapper = XmlWrapper::from_node_set(doc, vec![root], HashMap::new());

        let x = wrapper.get("x").unwrap();
        assert_eq!(x.count(), 1);
        assert_eq!(x.as_text(), "1");
        assert_eq!(wrapper.bindings().get(DOX_PREFIX).map(String::as_str), Some(SRC_NAMESPACE));
        assert_eq!(wrapper.query("dox:x").unwrap().unwrap().as_text(), "1");
    }
}
