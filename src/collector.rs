//! Reads the XML written by the documentation collector and replays it as
//! build events.
//!
//! Expected layout:
//!
//! ```text
//! <dir>/index.xml
//! <dir>/source.xml
//! <dir>/classes/*.xml
//! <dir>/interfaces/*.xml
//! <dir>/traits/*.xml
//! ```

use crate::engine::BuildContext;
use crate::error::EngineError;
use crate::events::{BuildStartEvent, ClassEndEvent, InterfaceEndEvent, TraitEndEvent};
use crate::objects::ObjectKind;
use doxweave_dom::Document;
use log::{debug, error};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct CollectorDir {
    root: PathBuf,
}

impl CollectorDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CollectorDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The start event for a build over this directory, with `config` as the
    /// project configuration.
    pub fn start_event(&self, config: Arc<Document>) -> Result<BuildStartEvent, EngineError> {
        let index = load(&self.root.join("index.xml"))?;
        let source_tree = load(&self.root.join("source.xml"))?;
        Ok(BuildStartEvent::new(config, index, source_tree))
    }

    /// Unit files of `kind`, sorted by file name. A missing directory has
    /// no units.
    pub fn units(&self, kind: ObjectKind) -> Result<Vec<PathBuf>, EngineError> {
        let dir = self.root.join(kind.output_subdir());
        if !dir.is_dir() {
            debug!("No {} directory in '{}'", kind.output_subdir(), self.root.display());
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|e| EngineError::io(&dir, e))?;
        let mut units = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| EngineError::io(&dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
                units.push(path);
            }
        }
        units.sort();
        Ok(units)
    }

    /// Feeds every unit to `build`: classes, then interfaces, then traits.
    ///
    /// A unit file that cannot be parsed is logged, counted as a failed
    /// render and skipped. Only an unreadable unit directory is an error.
    pub fn replay(&self, build: &mut BuildContext) -> Result<(), EngineError> {
        for path in self.units(ObjectKind::Class)? {
            if let Some(class) = load_unit(build, &path) {
                build.on_class_end(&ClassEndEvent { class });
            }
        }
        for path in self.units(ObjectKind::Interface)? {
            if let Some(interface) = load_unit(build, &path) {
                build.on_interface_end(&InterfaceEndEvent { interface });
            }
        }
        for path in self.units(ObjectKind::Trait)? {
            if let Some(unit) = load_unit(build, &path) {
                build.on_trait_end(&TraitEndEvent { unit });
            }
        }
        Ok(())
    }
}

fn load_unit(build: &mut BuildContext, path: &Path) -> Option<Arc<Document>> {
    match load(path) {
        Ok(doc) => Some(doc),
        Err(e) => {
            error!("Skipping unit '{}': {}", path.display(), e);
            build.record_failure();
            None
        }
    }
}

/// Parses one XML file.
pub fn load(path: &Path) -> Result<Arc<Document>, EngineError> {
    debug!("Loading '{}'", path.display());
    Ok(Arc::new(Document::from_file(path)?))
}
