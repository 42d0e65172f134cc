//! Explicit path queries evaluated relative to a wrapper's first node.

use crate::error::WrapperError;
use doxweave_xpath::ast::NodeTypeTest;
use doxweave_xpath::{Axis, Expression, FunctionRegistry, NodeTest, Step, parse_expression};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything needed to run queries, built on the first query and reused.
pub(crate) struct QueryContext {
    pub(crate) functions: FunctionRegistry,
    expressions: Mutex<HashMap<String, Arc<Expression>>>,
}

impl QueryContext {
    pub(crate) fn new() -> Self {
        log::debug!("Building query context");
        QueryContext {
            functions: FunctionRegistry::default(),
            expressions: Mutex::new(HashMap::new()),
        }
    }

    /// Parses and anchors `path`, caching the result by its source text.
    pub(crate) fn compile(&self, path: &str) -> Result<Arc<Expression>, WrapperError> {
        if let Some(expr) = self.expressions.lock().get(path) {
            return Ok(Arc::clone(expr));
        }
        let parsed = parse_expression(path).map_err(|source| WrapperError::Query {
            query: path.to_string(),
            source,
        })?;
        let expr = Arc::new(anchor(parsed));
        self.expressions
            .lock()
            .insert(path.to_string(), Arc::clone(&expr));
        Ok(expr)
    }
}

/// Makes a location path start at the context node.
///
/// `foo` becomes `./foo`, `/foo` becomes `./foo` and `//foo` becomes `.//foo`.
/// Paths already starting with `.` and other expressions are left alone.
pub fn anchor(expr: Expression) -> Expression {
    match expr {
        Expression::LocationPath(mut path) if path.start_point.is_none() => {
            let starts_at_context = !path.is_absolute
                && path
                    .steps
                    .first()
                    .is_some_and(|s| matches!(s.axis, Axis::SelfAxis | Axis::Parent));
            if !starts_at_context {
                path.is_absolute = false;
                path.steps.insert(
                    0,
                    Step {
                        axis: Axis::SelfAxis,
                        node_test: NodeTest::NodeType(NodeTypeTest::Node),
                        predicates: vec![],
                    },
                );
            }
            Expression::LocationPath(path)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(path: &str) -> Expression {
        anchor(parse_expression(path).unwrap())
    }

    #[test]
    fn test_anchor_forms() {
        assert_eq!(anchored("foo"), parse_expression("./foo").unwrap());
        assert_eq!(anchored("/foo"), parse_expression("./foo").unwrap());
        assert_eq!(anchored("//foo"), parse_expression(".//foo").unwrap());
        assert_eq!(anchored("@name"), parse_expression("./@name").unwrap());
        assert!(anchored("dox:member/@name").is_anchored());
    }

    #[test]
    fn test_already_anchored_paths_unchanged() {
        assert_eq!(anchored("./foo"), parse_expression("./foo").unwrap());
        assert_eq!(anchored(".//foo"), parse_expression(".//foo").unwrap());
        assert_eq!(anchored(".."), parse_expression("..").unwrap());
    }

    #[test]
    fn test_non_paths_unchanged() {
        assert_eq!(anchored("count(foo)"), parse_expression("count(foo)").unwrap());
    }

    #[test]
    fn test_compile_caches_and_reports_errors() {
        let ctx = QueryContext::new();
        let first = ctx.compile("dox:member").unwrap();
        let second = ctx.compile("dox:member").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(ctx.compile("dox:member["), Err(WrapperError::Query { .. })));
    }
}
