//! Template helpers exposing `XmlWrapper` operations to Handlebars.
//!
//! Used as subexpressions the helpers yield JSON (a handle, a bool, a number
//! or a string), so `(get class "method")` can feed another helper or an
//! `#each`. Used directly they write the text of that value.
//!
//! Dotted and bracketed paths that reach into a wrapper, such as
//! `{{class.name}}` or `{{class.method.[1].name}}`, go through the same
//! resolution policy as `get`: as bare expressions via the `helperMissing`
//! hook, and as the subject of any helper here. Built-in block helpers such
//! as `#if` and `#each` only see plain JSON, so they take `(get ...)` or
//! `(items ...)` instead.

use super::escape_object_name;
use super::handles::{HandleTable, is_handle};
use crate::wrapper::{Lookup, XmlWrapper};
use std::borrow::Cow;
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, ScopedJson,
};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperOp {
    Get,
    Has,
    Query,
    Items,
    Text,
    Count,
    Xml,
    Id,
}

impl WrapperOp {
    pub const ALL: [WrapperOp; 8] = [
        WrapperOp::Get,
        WrapperOp::Has,
        WrapperOp::Query,
        WrapperOp::Items,
        WrapperOp::Text,
        WrapperOp::Count,
        WrapperOp::Xml,
        WrapperOp::Id,
    ];

    pub fn helper_name(self) -> &'static str {
        match self {
            WrapperOp::Get => "get",
            WrapperOp::Has => "has",
            WrapperOp::Query => "query",
            WrapperOp::Items => "items",
            WrapperOp::Text => "text",
            WrapperOp::Count => "count",
            WrapperOp::Xml => "xml",
            WrapperOp::Id => "id",
        }
    }
}

pub struct WrapperHelper {
    op: WrapperOp,
    handles: HandleTable,
}

impl WrapperHelper {
    pub fn new(op: WrapperOp, handles: HandleTable) -> Self {
        WrapperHelper { op, handles }
    }

    /// Registers one helper per operation on `registry`, plus the
    /// `helperMissing` hook that renders dotted paths into wrappers.
    pub fn register_all(registry: &mut Handlebars<'_>, handles: &HandleTable) {
        for op in WrapperOp::ALL {
            registry.register_helper(op.helper_name(), Box::new(WrapperHelper::new(op, handles.clone())));
        }
        registry.register_helper(
            "helperMissing",
            Box::new(PathHelper {
                handles: handles.clone(),
            }),
        );
    }

    /// The wrapper passed as first parameter. A missing value or `null`
    /// reads as an empty wrapper so lookups on misses stay misses.
    fn subject<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        ctx: &'rc Context,
        rc: &RenderContext<'reg, 'rc>,
    ) -> Result<Option<XmlWrapper>, RenderError> {
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex(self.op.helper_name(), 0))?;
        if let Some(path) = param.relative_path().filter(|_| param.is_value_missing()) {
            return Ok(resolve_path(&self.handles, path, ctx, rc)?.flatten());
        }
        self.handles
            .resolve(param.value())
            .map_err(|e| RenderErrorReason::Other(format!("{}: {}", self.op.helper_name(), e)).into())
    }

    fn lookups<'h>(&self, h: &'h Helper<'_>, min: usize) -> Result<Vec<Lookup<'h>>, RenderError> {
        let params = h.params();
        if params.len() < 1 + min {
            return Err(RenderErrorReason::ParamNotFoundForIndex(self.op.helper_name(), params.len()).into());
        }
        params[1..]
            .iter()
            .map(|p| -> Result<Lookup<'h>, RenderError> {
                match p.value() {
                    Value::String(name) => Ok(Lookup::from(name.as_str())),
                    Value::Number(n) => n
                        .as_u64()
                        .map(|i| Lookup::Index(i as usize))
                        .ok_or_else(|| RenderErrorReason::InvalidParamType("non-negative integer").into()),
                    _ => Err(RenderErrorReason::InvalidParamType("name or index").into()),
                }
            })
            .collect()
    }

    fn handle_or_null(&self, wrapper: Option<XmlWrapper>) -> Value {
        wrapper.map_or(Value::Null, |w| self.handles.insert(w))
    }

    fn evaluate<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        ctx: &'rc Context,
        rc: &RenderContext<'reg, 'rc>,
    ) -> Result<Value, RenderError> {
        let subject = || self.subject(h, ctx, rc);
        let value = match self.op {
            WrapperOp::Get => {
                let lookups = self.lookups(h, 0)?;
                let found = subject()?.and_then(|w| lookups.into_iter().try_fold(w, |w, lookup| w.get(lookup)));
                self.handle_or_null(found)
            }
            WrapperOp::Has => {
                let mut lookups = self.lookups(h, 1)?;
                let last = lookups.pop();
                let parent = subject()?.and_then(|w| lookups.into_iter().try_fold(w, |w, lookup| w.get(lookup)));
                let found = match (parent, last) {
                    (Some(w), Some(lookup)) => w.exists(lookup),
                    _ => false,
                };
                Value::Bool(found)
            }
            WrapperOp::Query => {
                let path = h
                    .param(1)
                    .and_then(|p| p.value().as_str())
                    .ok_or(RenderErrorReason::ParamNotFoundForIndex("query", 1))?;
                let found = match subject()? {
                    Some(w) => w
                        .query(path)
                        .map_err(|e| RenderErrorReason::Other(e.to_string()))?,
                    None => None,
                };
                self.handle_or_null(found)
            }
            WrapperOp::Items => {
                let items = subject()?
                    .iter()
                    .flat_map(|w| w.iter())
                    .map(|item| self.handles.insert(item))
                    .collect();
                Value::Array(items)
            }
            WrapperOp::Text => json!(subject()?.map(|w| w.as_text()).unwrap_or_default()),
            WrapperOp::Count => json!(subject()?.map_or(0, |w| w.count())),
            WrapperOp::Xml => {
                let xml = match subject()? {
                    Some(w) => w
                        .as_xml_string()
                        .map_err(|e| RenderErrorReason::Other(e.to_string()))?,
                    None => String::new(),
                };
                json!(xml)
            }
            WrapperOp::Id => self.evaluate_id(h, ctx, rc)?,
        };
        Ok(value)
    }

    // `id` also accepts plain strings, so it cannot go through `subject`.
    fn evaluate_id<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        ctx: &'rc Context,
        rc: &RenderContext<'reg, 'rc>,
    ) -> Result<Value, RenderError> {
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("id", 0))?;
        if let Some(path) = param.relative_path().filter(|_| param.is_value_missing()) {
            let found = resolve_path(&self.handles, path, ctx, rc)?.flatten();
            let raw = found.map(|w| w.as_text()).unwrap_or_default();
            return Ok(json!(escape_object_name(&raw)));
        }
        let raw = match param.value() {
            Value::String(s) => s.clone(),
            v if is_handle(v) => self.text_of(v)?,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(json!(escape_object_name(&raw)))
    }

    fn text_of(&self, value: &Value) -> Result<String, RenderError> {
        self.handles
            .resolve(value)
            .map(|w| w.map(|w| w.as_text()).unwrap_or_default())
            .map_err(|e| RenderErrorReason::Other(e).into())
    }

    /// Text written when the helper is used as an expression.
    fn render_value(&self, value: &Value) -> Result<String, RenderError> {
        Ok(match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(items) => items.len().to_string(),
            v if is_handle(v) => self.text_of(v)?,
            other => other.to_string(),
        })
    }
}

impl HelperDef for WrapperHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        self.evaluate(h, ctx, rc).map(ScopedJson::Derived)
    }

    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = self.evaluate(h, ctx, rc)?;
        let text = self.render_value(&value)?;
        write_text(r, rc, out, &text)
    }
}

fn write_text(r: &Handlebars<'_>, rc: &RenderContext<'_, '_>, out: &mut dyn Output, text: &str) -> HelperResult {
    if rc.is_disable_escape() {
        out.write(text)?;
    } else {
        out.write(&(r.get_escape_fn())(text))?;
    }
    Ok(())
}

/// The `helperMissing` hook. Handlebars calls it for a name-only expression
/// whose path is not in the data, which is how `{{class.name}}` reaches a
/// wrapper. Paths that touch no wrapper render nothing, as they would
/// without the hook.
pub struct PathHelper {
    handles: HandleTable,
}

impl HelperDef for PathHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        // The hook also catches calls to unknown helpers.
        if !h.params().is_empty() || !h.hash().is_empty() {
            return Err(RenderErrorReason::HelperNotFound(h.name().to_string()).into());
        }
        match resolve_path(&self.handles, h.name(), ctx, rc)? {
            Some(found) => write_text(r, rc, out, &found.map(|w| w.as_text()).unwrap_or_default()),
            None => Ok(()),
        }
    }
}

/// A template path such as `../class.method.[1].name`.
#[derive(Debug, PartialEq, Eq)]
struct DottedPath<'a> {
    parents: usize,
    segments: Vec<Segment<'a>>,
}

#[derive(Debug, PartialEq, Eq)]
struct Segment<'a> {
    raw: &'a str,
    bracketed: bool,
}

impl<'a> Segment<'a> {
    fn new(raw: &'a str) -> Option<Self> {
        let bracketed = raw.len() > 2 && raw.starts_with('[') && raw.ends_with(']');
        if raw.is_empty() || (raw.starts_with('[') && !bracketed) {
            return None;
        }
        Some(Segment { raw, bracketed })
    }

    /// Bracketed segments are always names; `[1]` is an element called `1`.
    fn lookup(&self) -> Lookup<'a> {
        if self.bracketed {
            return Lookup::Name(Cow::Borrowed(&self.raw[1..self.raw.len() - 1]));
        }
        match self.raw.parse::<usize>() {
            Ok(index) if self.raw.bytes().all(|b| b.is_ascii_digit()) => Lookup::Index(index),
            _ => Lookup::Name(Cow::Borrowed(self.raw)),
        }
    }
}

impl<'a> DottedPath<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let mut rest = path;
        let mut parents = 0;
        while let Some(stripped) = rest.strip_prefix("../") {
            parents += 1;
            rest = stripped;
        }

        let mut segments = Vec::new();
        let mut start = 0;
        let mut in_brackets = false;
        for (i, c) in rest.char_indices() {
            match c {
                '[' if i == start => in_brackets = true,
                ']' if in_brackets => in_brackets = false,
                '.' | '/' if !in_brackets => {
                    segments.push(Segment::new(&rest[start..i])?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if in_brackets {
            return None;
        }
        segments.push(Segment::new(&rest[start..])?);
        Some(DottedPath { parents, segments })
    }

    /// The Handlebars path of the first `len` segments, or of the current
    /// block's `this` when `len` is zero.
    fn prefix(&self, len: usize) -> String {
        let head = if len == 0 {
            "this".to_string()
        } else {
            self.segments[..len]
                .iter()
                .map(|s| s.raw)
                .collect::<Vec<_>>()
                .join(".")
        };
        format!("{}{}", "../".repeat(self.parents), head)
    }
}

/// Resolves a template path that plain JSON lookup could not follow. The
/// shortest prefix that names a wrapper handle is taken as the base and the
/// rest of the path is applied with `get`; a path with no such prefix is
/// tried against `this`. `None` when neither names a wrapper.
fn resolve_path<'reg: 'rc, 'rc>(
    handles: &HandleTable,
    path: &str,
    ctx: &'rc Context,
    rc: &RenderContext<'reg, 'rc>,
) -> Result<Option<Option<XmlWrapper>>, RenderError> {
    let Some(path) = DottedPath::parse(path) else {
        return Ok(None);
    };
    let bases = (1..path.segments.len()).chain(std::iter::once(0));
    for len in bases {
        let base = rc.evaluate(ctx, &path.prefix(len))?;
        let base = base.as_json();
        if !is_handle(base) {
            continue;
        }
        let wrapper = handles
            .resolve(base)
            .map_err(RenderErrorReason::Other)?;
        let found = wrapper.and_then(|w| {
            path.segments[len..]
                .iter()
                .try_fold(w, |w, segment| w.get(segment.lookup()))
        });
        return Ok(Some(found));
    }
    Ok(None)
}
