//! Syntax tree for the path query language.

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
}

impl Expression {
    pub fn is_location_path(&self) -> bool {
        matches!(self, Expression::LocationPath(_))
    }

    /// Returns true when the expression is a relative path whose first step is
    /// the context node (`.` or `self::`). Such paths never leave the subtree
    /// of the node they are evaluated against through their first step.
    pub fn is_anchored(&self) -> bool {
        match self {
            Expression::LocationPath(path) => {
                path.start_point.is_none()
                    && !path.is_absolute
                    && path.steps.first().is_some_and(|s| s.axis == Axis::SelfAxis)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Union,
}

/// A location path such as `./dox:member[@name='x']/dox:docblock`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// Primary expression the path continues from, as in `(a | b)/c`.
    pub start_point: Option<Box<Expression>>,
    /// Path starts at the root of the evaluation scope (`/foo`).
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    /// The expansion of the `//` abbreviation.
    pub(crate) fn any_descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::NodeType(NodeTypeTest::Node),
            predicates: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    FollowingSibling,
    PrecedingSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `local` or `prefix:local`.
    Name {
        prefix: Option<String>,
        local: String,
    },
    /// `*`
    Wildcard,
    /// `prefix:*`
    NamespaceWildcard(String),
    NodeType(NodeTypeTest),
}

impl NodeTest {
    pub fn name(prefix: Option<&str>, local: &str) -> Self {
        NodeTest::Name {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTypeTest {
    Text,
    Node,
    Comment,
    ProcessingInstruction,
}
