//! Comparison, arithmetic and union operators.

use super::ast::BinaryOperator;
use super::engine::{XPathValue, parse_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

/// Evaluates every operator except the short-circuiting `and` and `or`.
pub fn evaluate<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let value = match op {
        BinaryOperator::Union => {
            let mut nodes = left.into_node_set()?;
            nodes.extend(right.into_node_set()?);
            nodes.sort();
            nodes.dedup();
            XPathValue::NodeSet(nodes)
        }
        BinaryOperator::Equals
        | BinaryOperator::NotEquals
        | BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => XPathValue::Boolean(compare(op, &left, &right)),
        BinaryOperator::Plus => XPathValue::Number(left.to_number() + right.to_number()),
        BinaryOperator::Minus => XPathValue::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => XPathValue::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => XPathValue::Number(left.to_number() / right.to_number()),
        BinaryOperator::Modulo => XPathValue::Number(left.to_number() % right.to_number()),
        BinaryOperator::And => XPathValue::Boolean(left.to_bool() && right.to_bool()),
        BinaryOperator::Or => XPathValue::Boolean(left.to_bool() || right.to_bool()),
    };
    Ok(value)
}

/// A scalar stand-in used once node sets have been expanded.
#[derive(Debug, Clone)]
enum Atom {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Atom {
    fn as_number(&self) -> f64 {
        match self {
            Atom::String(s) => parse_number(s),
            Atom::Number(n) => *n,
            Atom::Boolean(b) => f64::from(u8::from(*b)),
        }
    }

    fn as_bool(&self) -> bool {
        match self {
            Atom::String(s) => !s.is_empty(),
            Atom::Number(n) => *n != 0.0 && !n.is_nan(),
            Atom::Boolean(b) => *b,
        }
    }

    fn as_string(&self) -> String {
        match self {
            Atom::String(s) => s.clone(),
            Atom::Number(n) => super::engine::format_number(*n),
            Atom::Boolean(b) => b.to_string(),
        }
    }
}

/// Comparison with node-set semantics: a node set compares true when any of
/// its members' string values does, and against a boolean by its own truth.
fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(_), XPathValue::Boolean(b)) => {
            compare_atoms(op, &Atom::Boolean(left.to_bool()), &Atom::Boolean(*b))
        }
        (XPathValue::Boolean(b), XPathValue::NodeSet(_)) => {
            compare_atoms(op, &Atom::Boolean(*b), &Atom::Boolean(right.to_bool()))
        }
        _ => {
            let lefts = atoms(left);
            let rights = atoms(right);
            lefts
                .iter()
                .any(|l| rights.iter().any(|r| compare_atoms(op, l, r)))
        }
    }
}

fn atoms<'a, N: DataSourceNode<'a>>(value: &XPathValue<N>) -> Vec<Atom> {
    match value {
        XPathValue::NodeSet(nodes) => nodes.iter().map(|n| Atom::String(n.string_value())).collect(),
        XPathValue::String(s) => vec![Atom::String(s.clone())],
        XPathValue::Number(n) => vec![Atom::Number(*n)],
        XPathValue::Boolean(b) => vec![Atom::Boolean(*b)],
    }
}

fn compare_atoms(op: BinaryOperator, left: &Atom, right: &Atom) -> bool {
    match op {
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let equal = match (left, right) {
                (Atom::Boolean(_), _) | (_, Atom::Boolean(_)) => left.as_bool() == right.as_bool(),
                (Atom::Number(_), _) | (_, Atom::Number(_)) => left.as_number() == right.as_number(),
                _ => left.as_string() == right.as_string(),
            };
            if op == BinaryOperator::Equals { equal } else { !equal }
        }
        BinaryOperator::LessThan => left.as_number() < right.as_number(),
        BinaryOperator::LessThanOrEqual => left.as_number() <= right.as_number(),
        BinaryOperator::GreaterThan => left.as_number() > right.as_number(),
        BinaryOperator::GreaterThanOrEqual => left.as_number() >= right.as_number(),
        _ => false,
    }
}
