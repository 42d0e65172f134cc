//! Evaluation of a parsed expression against a generic `DataSourceNode`.

use super::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step};
use super::functions::{self, FunctionRegistry};
use super::{axes, operators};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// The namespace the `xml` prefix is always bound to.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Result of evaluating an expression.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => parse_number(s),
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map_or(f64::NAN, |n| parse_number(&n.string_value())),
        }
    }

    /// The node set, or a type error for scalar results.
    pub fn into_node_set(self) -> Result<Vec<N>, XPathError> {
        match self {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError(format!(
                "expected a node-set, found {}",
                other.type_name()
            ))),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }
}

pub(crate) fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// String conversion as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => f.write_str(
                &nodes.first().map(|n| n.string_value()).unwrap_or_default(),
            ),
            XPathValue::String(s) => f.write_str(s),
            XPathValue::Number(n) => f.write_str(&format_number(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// All state needed while evaluating an expression.
/// `'a` is the lifetime of the tree, `'d` that of the borrowed registries.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    /// Target of absolute paths; the top of the evaluation scope.
    pub root_node: N,
    pub functions: &'d FunctionRegistry,
    /// Prefix to namespace URI bindings for name tests.
    pub namespaces: &'d HashMap<String, String>,
    pub context_position: usize, // 1-based
    pub context_size: usize,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    pub fn new(
        context_node: N,
        root_node: N,
        functions: &'d FunctionRegistry,
        namespaces: &'d HashMap<String, String>,
    ) -> Self {
        Self {
            context_node,
            root_node,
            functions,
            namespaces,
            context_position: 1,
            context_size: 1,
            _marker: PhantomData,
        }
    }

    /// The same context focused on another node.
    fn focus(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            root_node: self.root_node,
            functions: self.functions,
            namespaces: self.namespaces,
            context_position: position,
            context_size: size,
            _marker: PhantomData,
        }
    }

    pub fn resolve_prefix(&self, prefix: &str) -> Result<&'d str, XPathError> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE);
        }
        self.namespaces
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| XPathError::UnboundPrefix(prefix.to_string()))
    }
}

pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => Ok(XPathValue::NodeSet(evaluate_location_path(path, e_ctx)?)),
        Expression::FunctionCall { name, args } => {
            e_ctx.functions.check(name, args.len())?;
            let evaluated = args
                .iter()
                .map(|arg| evaluate(arg, e_ctx))
                .collect::<Result<Vec<_>, _>>()?;
            functions::evaluate_function(name, evaluated, e_ctx)
        }
        Expression::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => Ok(XPathValue::Boolean(
            evaluate(left, e_ctx)?.to_bool() && evaluate(right, e_ctx)?.to_bool(),
        )),
        Expression::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => Ok(XPathValue::Boolean(
            evaluate(left, e_ctx)?.to_bool() || evaluate(right, e_ctx)?.to_bool(),
        )),
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::Negate(inner) => Ok(XPathValue::Number(-evaluate(inner, e_ctx)?.to_number())),
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut current = if let Some(start) = &path.start_point {
        evaluate(start, e_ctx)?.into_node_set()?
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    for step in &path.steps {
        current = evaluate_step(step, &current, e_ctx)?;
    }
    Ok(current)
}

/// Applies one step to every context node, then merges the per-node results
/// into a single set in document order.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let test = ResolvedTest::new(&step.node_test, step.axis, e_ctx)?;
    let mut result = Vec::new();
    let mut axis_nodes = Vec::new();

    for &node in context_nodes {
        axis_nodes.clear();
        axes::collect(step.axis, node, &mut axis_nodes);
        let tested: Vec<N> = axis_nodes.iter().copied().filter(|n| test.matches(n)).collect();
        result.extend(apply_predicates(tested, &step.predicates, e_ctx)?);
    }

    result.sort();
    result.dedup();
    Ok(result)
}

/// A node test with its prefix already resolved to a namespace URI.
struct ResolvedTest<'t, 'd> {
    test: &'t NodeTest,
    namespace: Option<&'d str>,
    principal: NodeType,
}

impl<'t, 'd> ResolvedTest<'t, 'd> {
    fn new<'a, N: DataSourceNode<'a>>(
        test: &'t NodeTest,
        axis: Axis,
        e_ctx: &EvaluationContext<'a, 'd, N>,
    ) -> Result<Self, XPathError> {
        let namespace = match test {
            NodeTest::Name {
                prefix: Some(prefix),
                ..
            }
            | NodeTest::NamespaceWildcard(prefix) => Some(e_ctx.resolve_prefix(prefix)?),
            _ => None,
        };
        let principal = if axis == Axis::Attribute {
            NodeType::Attribute
        } else {
            NodeType::Element
        };
        Ok(Self {
            test,
            namespace,
            principal,
        })
    }

    fn matches<'a, N: DataSourceNode<'a>>(&self, node: &N) -> bool {
        match self.test {
            NodeTest::Wildcard => node.node_type() == self.principal,
            NodeTest::NamespaceWildcard(_) => {
                node.node_type() == self.principal && node.namespace_uri() == self.namespace
            }
            NodeTest::Name { local, .. } => {
                node.node_type() == self.principal
                    && node.namespace_uri() == self.namespace
                    && node.name().is_some_and(|q| q.local_part == local)
            }
            NodeTest::NodeType(kind) => match kind {
                NodeTypeTest::Node => true,
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction => {
                    node.node_type() == NodeType::ProcessingInstruction
                }
            },
        }
    }
}

/// Filters nodes (in axis order) through each predicate in turn.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut remaining = nodes;
    for predicate in predicates {
        let size = remaining.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in remaining.into_iter().enumerate() {
            let position = i + 1;
            let result = evaluate(predicate, &e_ctx.focus(node, position, size))?;
            let keep = match result {
                XPathValue::Number(n) => n == position as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(node);
            }
        }
        remaining = kept;
    }
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::mock::{DOX_NS, MockNode, MockTree, class_tree};
    use crate::parser::parse_expression;

    fn eval<'a>(tree: &'a MockTree, context: usize, query: &str) -> Result<XPathValue<MockNode<'a>>, XPathError> {
        let funcs = FunctionRegistry::default();
        let mut namespaces = HashMap::new();
        namespaces.insert("dox".to_string(), DOX_NS.to_string());
        let e_ctx = EvaluationContext::new(tree.node(context), tree.node(0), &funcs, &namespaces);
        evaluate(&parse_expression(query)?, &e_ctx)
    }

    fn node_ids(value: XPathValue<MockNode<'_>>) -> Vec<usize> {
        value.into_node_set().unwrap().iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_prefixed_name_matches_namespace_only() {
        let tree = class_tree();
        assert_eq!(node_ids(eval(&tree, 1, "./dox:method").unwrap()), vec![4, 9]);
        assert_eq!(node_ids(eval(&tree, 1, "./method").unwrap()), vec![12]);
    }

    #[test]
    fn test_local_name_ignores_namespace() {
        let tree = class_tree();
        let result = eval(&tree, 1, "./*[local-name() = 'method']").unwrap();
        assert_eq!(node_ids(result), vec![4, 9, 12]);
    }

    #[test]
    fn test_attribute_step() {
        let tree = class_tree();
        let result = eval(&tree, 1, "./@full").unwrap();
        assert_eq!(result.to_string(), "App\\Foo");
    }

    #[test]
    fn test_predicate_by_attribute_and_position() {
        let tree = class_tree();
        let result = eval(&tree, 1, "dox:method[@visibility='private']/@name").unwrap();
        assert_eq!(result.to_string(), "b");
        let result = eval(&tree, 1, "dox:method[2]").unwrap();
        assert_eq!(node_ids(result), vec![9]);
        let result = eval(&tree, 1, "*[last()]").unwrap();
        assert_eq!(node_ids(result), vec![12]);
    }

    #[test]
    fn test_reverse_axis_position_counts_from_nearest() {
        let tree = class_tree();
        let result = eval(&tree, 8, "ancestor::*[1]").unwrap();
        assert_eq!(node_ids(result), vec![7]);
    }

    #[test]
    fn test_descendant_results_sorted_and_unique() {
        let tree = class_tree();
        let result = eval(&tree, 1, ".//dox:docblock/ancestor-or-self::dox:*").unwrap();
        assert_eq!(node_ids(result), vec![1, 4, 7]);
    }

    #[test]
    fn test_absolute_path_uses_root_node() {
        let tree = class_tree();
        let result = eval(&tree, 7, "/dox:class/@name").unwrap();
        assert_eq!(result.to_string(), "Foo");
    }

    #[test]
    fn test_unbound_prefix_is_an_error() {
        let tree = class_tree();
        let err = eval(&tree, 1, "./php:method").unwrap_err();
        assert_eq!(err, XPathError::UnboundPrefix("php".into()));
    }

    #[test]
    fn test_scalar_results() {
        let tree = class_tree();
        assert_eq!(eval(&tree, 1, "count(dox:method)").unwrap().to_number(), 2.0);
        assert!(eval(&tree, 1, "dox:method and not(dox:missing)").unwrap().to_bool());
        assert_eq!(eval(&tree, 1, "string(dox:method/dox:docblock)").unwrap().to_string(), "Does a");
    }
}
