#![allow(dead_code)]

pub mod fixtures;

use doxweave::engine::{EngineConfig, ProjectPaths};
use doxweave::events::BuildStartEvent;
use doxweave::wrapper::{SRC_NAMESPACE, XmlWrapper};
use doxweave_dom::Document;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn doc(xml: &str) -> Arc<Document> {
    Arc::new(Document::parse(xml).expect("fixture XML must parse"))
}

/// The document element of `xml`, bound to the documentation namespace.
pub fn wrap(xml: &str) -> XmlWrapper {
    XmlWrapper::from_document(doc(xml), SRC_NAMESPACE)
}

pub fn start_event() -> BuildStartEvent {
    BuildStartEvent::new(
        doc(fixtures::PROJECT),
        doc(fixtures::INDEX),
        doc(fixtures::SOURCE_TREE),
    )
}

/// A scratch project: a template directory and an output directory below a
/// temporary root that is removed on drop.
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        init_logger();
        Workspace {
            root: tempfile::tempdir().expect("temporary directory"),
        }
    }

    /// A workspace whose template directory holds the full test theme.
    pub fn with_theme() -> Self {
        let ws = Self::new();
        for (name, source) in fixtures::theme() {
            ws.write_template(name, source);
        }
        ws
    }

    pub fn template_dir(&self) -> PathBuf {
        self.root.path().join("templates")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("out")
    }

    pub fn write_template(&self, name: &str, source: &str) {
        write_file(&self.template_dir().join(name), source);
    }

    pub fn write_resource(&self, relative: &str, contents: &str) {
        write_file(&self.template_dir().join("resources").join(relative), contents);
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig::builder(ProjectPaths::new(self.root.path(), self.root.path()))
            .with_template_dir(self.template_dir())
            .with_output_dir(self.output_dir())
            .with_cache_dir("")
            .build()
    }

    pub fn read_output(&self, relative: &str) -> String {
        fs::read_to_string(self.output_dir().join(relative))
            .unwrap_or_else(|e| panic!("missing output '{}': {}", relative, e))
    }
}

pub fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().expect("path has a parent")).expect("create parent");
    fs::write(path, contents).expect("write file");
}
