//! Template-driven HTML rendering of collector XML.
//!
//! Documentation collected from source code arrives as XML in the
//! `http://xml.phpdox.net/src` namespace. This crate exposes that XML to
//! Handlebars templates through [`XmlWrapper`], which resolves bare names
//! (`class.get("name")`) to attributes or child elements, and drives the
//! rendering of one page per class, interface and trait plus a few overview
//! pages.

pub mod collector;
pub mod engine;
pub mod error;
pub mod events;
pub mod objects;
pub mod wrapper;

pub use engine::{BuildContext, BuildReport, Engine, EngineConfig, ProjectPaths, escape_object_name};
pub use error::{ConfigError, EngineError, WrapperError};
pub use events::{BuildEndEvent, BuildStartEvent, ClassEndEvent, InterfaceEndEvent, TraitEndEvent};
pub use objects::{ClassObject, InterfaceObject, ObjectAdapter, ObjectKind, TraitObject};
pub use wrapper::{Lookup, XmlWrapper};
