// src/error.rs
use doxweave_dom::DomError;
use doxweave_xpath::XPathError;
use std::path::PathBuf;
use thiserror::Error;

/// Misuse of an `XmlWrapper`. A lookup that finds nothing is not an error.
#[derive(Error, Debug)]
pub enum WrapperError {
    #[error("XmlWrapper is read-only: elements can't be {0}")]
    Immutable(&'static str),

    #[error("Invalid query '{query}': {source}")]
    Query {
        query: String,
        #[source]
        source: XPathError,
    },

    #[error("Failed to serialize node: {0}")]
    Serialize(#[from] DomError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown log level '{0}'")]
    InvalidLogLevel(String),
}

/// A comprehensive error type for the render lifecycle.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template directory '{}' is not usable: {reason}", path.display())]
    TemplateDirectory { path: PathBuf, reason: String },

    #[error("Template '{0}' is not registered")]
    MissingTemplate(String),

    #[error("Template rendering error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Object has no name to derive an output file from")]
    UnnamedObject,

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(#[from] DomError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}
