//! Relative path queries over read-only XML trees.
//!
//! The language is the location-path core of XPath 1.0: all forward and
//! reverse axes except `following`/`preceding`, name tests with namespace
//! prefixes, node-type tests, predicates, the usual operators and a small
//! function library. Queries are evaluated against any tree that implements
//! [`DataSourceNode`].

pub mod ast;
pub mod axes;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
pub use datasource::{DataSourceNode, NodeType, QName};
pub use engine::{EvaluationContext, XPathValue, evaluate};
pub use error::XPathError;
pub use functions::FunctionRegistry;
pub use parser::parse_expression;
