//! Wrappers referenced from template data by opaque handles.
//!
//! Handlebars only sees JSON, so a wrapper handed to a template is stored in
//! the table and represented by `{"$wrapper": n}`. Helpers turn handles back
//! into wrappers.

use crate::wrapper::XmlWrapper;
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::sync::Arc;

pub const HANDLE_KEY: &str = "$wrapper";

/// Shared, append-only storage for the wrappers of one build.
#[derive(Clone, Default)]
pub struct HandleTable {
    wrappers: Arc<RwLock<Vec<XmlWrapper>>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `wrapper` and returns the handle standing for it.
    pub fn insert(&self, wrapper: XmlWrapper) -> Value {
        let mut wrappers = self.wrappers.write();
        wrappers.push(wrapper);
        json!({ HANDLE_KEY: wrappers.len() - 1 })
    }

    /// `Ok(None)` for `null` (a lookup that found nothing upstream).
    pub fn resolve(&self, value: &Value) -> Result<Option<XmlWrapper>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) => {
                let index = map
                    .get(HANDLE_KEY)
                    .and_then(Value::as_u64)
                    .ok_or_else(|| format!("expected a wrapper handle, got {}", value))?;
                self.wrappers
                    .read()
                    .get(index as usize)
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| format!("wrapper handle {} has been released", index))
            }
            other => Err(format!("expected a wrapper handle, got {}", other)),
        }
    }

    pub fn len(&self) -> usize {
        self.wrappers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current size, to be passed to `release` once the handles created
    /// after this point are no longer needed.
    pub fn watermark(&self) -> usize {
        self.len()
    }

    pub fn release(&self, watermark: usize) {
        self.wrappers.write().truncate(watermark);
    }
}

pub fn is_handle(value: &Value) -> bool {
    value.get(HANDLE_KEY).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use doxweave_dom::Document;

    fn wrapper(xml: &str) -> XmlWrapper {
        XmlWrapper::from_document(Arc::new(Document::parse(xml).unwrap()), "urn:x")
    }

    #[test]
    fn test_insert_and_resolve() {
        let table = HandleTable::new();
        let handle = table.insert(wrapper(r#"<a name="x"/>"#));
        assert!(is_handle(&handle));
        let resolved = table.resolve(&handle).unwrap().unwrap();
        assert_eq!(resolved.get("name").unwrap().as_text(), "x");
        assert!(table.resolve(&Value::Null).unwrap().is_none());
    }

    #[test]
    fn test_release_invalidates_later_handles() {
        let table = HandleTable::new();
        let global = table.insert(wrapper("<global/>"));
        let mark = table.watermark();
        let entity = table.insert(wrapper("<entity/>"));
        table.release(mark);

        assert!(table.resolve(&global).is_ok());
        assert!(table.resolve(&entity).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_non_handles_are_rejected() {
        let table = HandleTable::new();
        assert!(table.resolve(&json!("text")).is_err());
        assert!(table.resolve(&json!({ "other": 1 })).is_err());
    }
}
