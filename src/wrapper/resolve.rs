//! The bare-name resolution policy.
//!
//! A name is tried against a node in three tiers, stopping at the first one
//! that matches anything:
//!
//! 1. an attribute of the node without a namespace, with that local name;
//! 2. element children with that local name in the canonical namespace;
//! 3. element children with that local name in any namespace.
//!
//! All matching is case-sensitive. Nodes that are not elements have neither
//! attributes nor children, so nothing resolves against them.

use doxweave_dom::{Document, Element, NodeId, NodeKey};
use std::collections::HashMap;

/// Namespace state shared by a wrapper and every wrapper derived from it.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    bindings: HashMap<String, String>,
    canonical: Option<String>,
}

impl ResolutionContext {
    /// `canonical` is the namespace URI searched by the second tier.
    pub fn new(bindings: HashMap<String, String>, canonical: Option<String>) -> Self {
        ResolutionContext {
            bindings,
            canonical,
        }
    }

    pub fn bindings(&self) -> &HashMap<String, String> {
        &self.bindings
    }

    pub fn canonical_namespace(&self) -> Option<&str> {
        self.canonical.as_deref()
    }
}

/// Which tier a name resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Attribute,
    NamespacedChild,
    AnyChild,
}

/// Resolves `name` against `node`. An empty result means not found.
pub fn resolve(doc: &Document, node: NodeKey, name: &str, ctx: &ResolutionContext) -> Vec<NodeKey> {
    let Some((id, element)) = as_element(doc, node) else {
        return Vec::new();
    };

    if let Some(idx) = element.attribute_index(None, name) {
        return vec![NodeKey::Attribute(id, idx)];
    }
    if let Some(ns) = ctx.canonical_namespace() {
        let children: Vec<NodeKey> = doc
            .child_elements(id)
            .filter(|(_, child)| child.name.is(Some(ns), name))
            .map(|(child_id, _)| NodeKey::Node(child_id))
            .collect();
        if !children.is_empty() {
            return children;
        }
    }
    doc.child_elements(id)
        .filter(|(_, child)| child.name.local() == name)
        .map(|(child_id, _)| NodeKey::Node(child_id))
        .collect()
}

/// The tier `name` would resolve in, without collecting the matches.
pub fn resolve_tier(doc: &Document, node: NodeKey, name: &str, ctx: &ResolutionContext) -> Option<Tier> {
    let (id, element) = as_element(doc, node)?;

    if element.attribute_index(None, name).is_some() {
        return Some(Tier::Attribute);
    }
    if let Some(ns) = ctx.canonical_namespace() {
        if doc.child_elements(id).any(|(_, child)| child.name.is(Some(ns), name)) {
            return Some(Tier::NamespacedChild);
        }
    }
    doc.child_elements(id)
        .any(|(_, child)| child.name.local() == name)
        .then_some(Tier::AnyChild)
}

fn as_element(doc: &Document, node: NodeKey) -> Option<(NodeId, &Element)> {
    match node {
        NodeKey::Node(id) => doc.element(id).map(|e| (id, e)),
        NodeKey::Attribute(..) => None,
    }
}
