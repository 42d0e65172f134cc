//! Registry and built-in implementations of the core function library.

use super::engine::{EvaluationContext, XPathValue};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;
use std::collections::HashMap;

/// Accepted argument counts for a function. `max` of `None` means variadic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Arity { min: n, max: Some(n) }
    }

    const fn between(min: usize, max: usize) -> Self {
        Arity { min, max: Some(max) }
    }

    const fn at_least(min: usize) -> Self {
        Arity { min, max: None }
    }

    fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    fn describe(&self) -> String {
        match self.max {
            Some(max) if max == self.min => format!("exactly {}", self.min),
            Some(max) => format!("{} to {}", self.min, max),
            None => format!("at least {}", self.min),
        }
    }
}

/// The functions a query may call, with the argument counts each accepts.
pub struct FunctionRegistry {
    functions: HashMap<&'static str, Arity>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        for (name, arity) in [
            ("position", Arity::exactly(0)),
            ("last", Arity::exactly(0)),
            ("count", Arity::exactly(1)),
            ("local-name", Arity::between(0, 1)),
            ("name", Arity::between(0, 1)),
            ("namespace-uri", Arity::between(0, 1)),
            ("string", Arity::between(0, 1)),
            ("concat", Arity::at_least(2)),
            ("contains", Arity::exactly(2)),
            ("starts-with", Arity::exactly(2)),
            ("substring-before", Arity::exactly(2)),
            ("substring-after", Arity::exactly(2)),
            ("substring", Arity::between(2, 3)),
            ("translate", Arity::exactly(3)),
            ("string-length", Arity::between(0, 1)),
            ("normalize-space", Arity::between(0, 1)),
            ("not", Arity::exactly(1)),
            ("true", Arity::exactly(0)),
            ("false", Arity::exactly(0)),
            ("boolean", Arity::exactly(1)),
            ("number", Arity::between(0, 1)),
            ("sum", Arity::exactly(1)),
            ("floor", Arity::exactly(1)),
            ("ceiling", Arity::exactly(1)),
            ("round", Arity::exactly(1)),
        ] {
            registry.register(name, arity);
        }
        registry
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, arity: Arity) {
        self.functions.insert(name, arity);
    }

    pub fn get(&self, name: &str) -> Option<Arity> {
        self.functions.get(name).copied()
    }

    /// Fails for unknown functions and for calls with the wrong number of arguments.
    pub fn check(&self, name: &str, arg_count: usize) -> Result<(), XPathError> {
        let arity = self.get(name).ok_or_else(|| XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown function".to_string(),
        })?;
        if arity.accepts(arg_count) {
            Ok(())
        } else {
            Err(XPathError::FunctionError {
                function: format!("{}()", name),
                message: format!("Expected {} arguments, got {}", arity.describe(), arg_count),
            })
        }
    }
}

/// Dispatches a call whose arity has already been checked.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let mut args = args.into_iter();
    let value = match name {
        // Node-set
        "position" => XPathValue::Number(e_ctx.context_position as f64),
        "last" => XPathValue::Number(e_ctx.context_size as f64),
        "count" => match args.next() {
            Some(XPathValue::NodeSet(nodes)) => XPathValue::Number(nodes.len() as f64),
            other => return Err(expected_node_set("count", other)),
        },
        "local-name" => {
            let node = target_node("local-name", args.next(), e_ctx)?;
            XPathValue::String(node.and_then(|n| n.name()).map(|q| q.local_part.to_string()).unwrap_or_default())
        }
        "name" => {
            let node = target_node("name", args.next(), e_ctx)?;
            XPathValue::String(node.and_then(|n| n.name()).map(|q| match q.prefix {
                Some(prefix) => format!("{}:{}", prefix, q.local_part),
                None => q.local_part.to_string(),
            }).unwrap_or_default())
        }
        "namespace-uri" => {
            let node = target_node("namespace-uri", args.next(), e_ctx)?;
            XPathValue::String(node.and_then(|n| n.namespace_uri()).unwrap_or_default().to_string())
        }

        // String
        "string" => XPathValue::String(string_or_context(args.next(), e_ctx)),
        "concat" => XPathValue::String(args.map(|a| a.to_string()).collect()),
        "contains" => {
            let (haystack, needle) = two_strings(args);
            XPathValue::Boolean(haystack.contains(&needle))
        }
        "starts-with" => {
            let (haystack, prefix) = two_strings(args);
            XPathValue::Boolean(haystack.starts_with(&prefix))
        }
        "substring-before" => {
            let (haystack, needle) = two_strings(args);
            XPathValue::String(haystack.find(&needle).map(|i| haystack[..i].to_string()).unwrap_or_default())
        }
        "substring-after" => {
            let (haystack, needle) = two_strings(args);
            XPathValue::String(
                haystack
                    .find(&needle)
                    .map(|i| haystack[i + needle.len()..].to_string())
                    .unwrap_or_default(),
            )
        }
        "substring" => {
            let s = args.next().map(|a| a.to_string()).unwrap_or_default();
            let start = args.next().map_or(f64::NAN, |a| a.to_number());
            let length = args.next().map(|a| a.to_number());
            XPathValue::String(substring(&s, start, length))
        }
        "translate" => {
            let (s, from) = (next_string(&mut args), next_string(&mut args));
            let to: Vec<char> = next_string(&mut args).chars().collect();
            let from: Vec<char> = from.chars().collect();
            let translated = s
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            XPathValue::String(translated)
        }
        "string-length" => {
            XPathValue::Number(string_or_context(args.next(), e_ctx).chars().count() as f64)
        }
        "normalize-space" => {
            let s = string_or_context(args.next(), e_ctx);
            XPathValue::String(s.split_whitespace().collect::<Vec<_>>().join(" "))
        }

        // Boolean
        "not" => XPathValue::Boolean(!args.next().is_some_and(|a| a.to_bool())),
        "true" => XPathValue::Boolean(true),
        "false" => XPathValue::Boolean(false),
        "boolean" => XPathValue::Boolean(args.next().is_some_and(|a| a.to_bool())),

        // Number
        "number" => XPathValue::Number(match args.next() {
            Some(arg) => arg.to_number(),
            None => XPathValue::NodeSet(vec![e_ctx.context_node]).to_number(),
        }),
        "sum" => match args.next() {
            Some(XPathValue::NodeSet(nodes)) => XPathValue::Number(
                nodes
                    .iter()
                    .map(|n| XPathValue::<N>::String(n.string_value()).to_number())
                    .sum(),
            ),
            other => return Err(expected_node_set("sum", other)),
        },
        "floor" => XPathValue::Number(next_number(&mut args).floor()),
        "ceiling" => XPathValue::Number(next_number(&mut args).ceil()),
        "round" => XPathValue::Number(round(next_number(&mut args))),

        _ => {
            return Err(XPathError::FunctionError {
                function: name.to_string(),
                message: "Unknown function".to_string(),
            });
        }
    };
    Ok(value)
}

fn expected_node_set<N>(function: &str, got: Option<XPathValue<N>>) -> XPathError {
    let found = match got {
        Some(XPathValue::String(_)) => "string",
        Some(XPathValue::Number(_)) => "number",
        Some(XPathValue::Boolean(_)) => "boolean",
        _ => "nothing",
    };
    XPathError::TypeError(format!("{}() argument must be a node-set, got {}", function, found))
}

/// The node a name function applies to: the first node of the argument, or
/// the context node when called without one.
fn target_node<'a, N: DataSourceNode<'a>>(
    function: &str,
    arg: Option<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Option<N>, XPathError> {
    match arg {
        None => Ok(Some(e_ctx.context_node)),
        Some(XPathValue::NodeSet(nodes)) => Ok(nodes.first().copied()),
        other => Err(expected_node_set(function, other)),
    }
}

fn string_or_context<'a, N: DataSourceNode<'a>>(
    arg: Option<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> String {
    match arg {
        Some(value) => value.to_string(),
        None => e_ctx.context_node.string_value(),
    }
}

fn next_string<'a, N: DataSourceNode<'a>>(args: &mut impl Iterator<Item = XPathValue<N>>) -> String {
    args.next().map(|a| a.to_string()).unwrap_or_default()
}

fn next_number<'a, N: DataSourceNode<'a>>(args: &mut impl Iterator<Item = XPathValue<N>>) -> f64 {
    args.next().map_or(f64::NAN, |a| a.to_number())
}

fn two_strings<'a, N: DataSourceNode<'a>>(mut args: impl Iterator<Item = XPathValue<N>>) -> (String, String) {
    (next_string(&mut args), next_string(&mut args))
}

/// Rounds half up, towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

/// 1-based character positions, with rounding applied to start and length.
fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let first = round(start);
    let end = match length {
        Some(len) => first + round(len),
        None => f64::INFINITY,
    };
    s.chars()
        .enumerate()
        .filter(|&(i, _)| {
            let pos = (i + 1) as f64;
            pos >= first && pos < end
        })
        .map(|(_, c)| c)
        .collect()
}
