//! An owned, immutable XML tree.
//!
//! Documents are parsed once from text into a flat arena in document order
//! and never change afterwards, so they can be shared freely behind an `Arc`.
//! [`Node`] is a cheap, copyable view into a document that implements
//! [`doxweave_xpath::DataSourceNode`], making any subtree queryable.

mod document;
mod error;
mod node;
mod serialize;

pub use document::{Attribute, Document, Element, ExpandedName, Namespace, NodeId, NodeKey, NodeKind};
pub use error::DomError;
pub use node::Node;
