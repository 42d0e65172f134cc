//! The render orchestrator.
//!
//! An [`Engine`] is started with the globals of a build and turns into a
//! [`BuildContext`], which renders one page per documented entity as the
//! collector reports them and the overview pages at the end:
//!
//! ```text
//! Engine::start(BuildStartEvent) -> BuildContext
//!     on_class_end / on_interface_end / on_trait_end   (any number)
//! BuildContext::finish(BuildEndEvent) -> BuildReport
//! ```
//!
//! A failed entity or page is logged and skipped; it never stops the build.

pub mod config;
pub mod handles;
pub mod helpers;
pub mod resources;

pub use config::{EngineConfig, EngineConfigBuilder, ProjectPaths, parse_log_level};
pub use handles::HandleTable;
pub use helpers::{WrapperHelper, WrapperOp};
pub use resources::{CopyStats, copy_resources};

use crate::error::EngineError;
use crate::events::{BuildEndEvent, BuildStartEvent, ClassEndEvent, InterfaceEndEvent, TraitEndEvent};
use crate::objects::{ClassObject, InterfaceObject, ObjectAdapter, TraitObject};
use crate::wrapper::{CONFIG_NAMESPACE, DOX_PREFIX, SRC_NAMESPACE, XmlWrapper};
use doxweave_dom::NodeKey;
use handlebars::Handlebars;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Overview pages rendered by [`BuildContext::finish`], in order.
pub const PAGES: [&str; 5] = ["index", "namespaces", "interfaces", "classes", "traits"];

const TEMPLATE_SUFFIX: &str = ".hbs";

/// Makes a fully qualified name usable as a file name by replacing `/`, `\`
/// and `:` with `_`.
pub fn escape_object_name(name: &str) -> String {
    name.replace(['/', '\\', ':'], "_")
}

/// Counts of what a build produced.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub rendered: usize,
    pub failed: usize,
    pub copied_resources: usize,
    pub failed_copies: usize,
}

pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads the templates and binds the build globals.
    ///
    /// Fails only when the template directory cannot be used. A template
    /// that does not compile is logged and left unregistered, so only the
    /// pages that need it fail.
    pub fn start(self, event: BuildStartEvent) -> Result<BuildContext, EngineError> {
        let config = self.config;
        debug!("Starting build with templates from '{}'", config.template_dir.display());

        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        match &config.cache_dir {
            Some(dir) => debug!("Template cache directory is '{}'", dir.display()),
            None => {
                debug!("Template caching disabled, templates are reloaded on every render");
                registry.set_dev_mode(true);
            }
        }

        let handles = HandleTable::new();
        WrapperHelper::register_all(&mut registry, &handles);
        register_templates(&mut registry, &config.template_dir)?;

        let project = XmlWrapper::from_single_node(
            event.config,
            NodeKey::Node(event.project),
            CONFIG_NAMESPACE,
        );
        let mut globals = Map::new();
        globals.insert("project".into(), handles.insert(project));
        globals.insert(
            "index".into(),
            handles.insert(XmlWrapper::from_document(event.index, SRC_NAMESPACE)),
        );
        globals.insert(
            "source_tree".into(),
            handles.insert(XmlWrapper::from_document(event.source_tree, SRC_NAMESPACE)),
        );
        globals.insert("xml_prefix".into(), Value::String(DOX_PREFIX.to_string()));
        globals.insert(
            "file_extension".into(),
            Value::String(config.file_extension.clone()),
        );

        Ok(BuildContext {
            config,
            registry,
            handles,
            globals,
            report: BuildReport::default(),
        })
    }
}

/// Registers every `*.hbs` file below `dir` under its relative path without
/// the suffix, so `class.html.hbs` becomes template `class.html`.
fn register_templates(registry: &mut Handlebars<'static>, dir: &Path) -> Result<(), EngineError> {
    if !dir.is_dir() {
        return Err(EngineError::TemplateDirectory {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    for entry in WalkDir::new(dir).min_depth(1).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        let Some(name) = relative.strip_suffix(TEMPLATE_SUFFIX) else {
            continue;
        };
        match registry.register_template_file(name, entry.path()) {
            Ok(()) => debug!("Registered template '{}'", name),
            Err(e) => error!("Failed to load template '{}': {}", name, e),
        }
    }
    Ok(())
}

/// Creates `dir` if it does not exist yet.
fn ensure_dir(dir: &Path) -> Result<(), EngineError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| EngineError::io(dir, e))?;
    info!("Created directory '{}'", dir.display());
    Ok(())
}

/// State of a running build.
pub struct BuildContext {
    config: EngineConfig,
    registry: Handlebars<'static>,
    handles: HandleTable,
    globals: Map<String, Value>,
    report: BuildReport,
}

impl BuildContext {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Counts an entity that never reached rendering.
    pub(crate) fn record_failure(&mut self) {
        self.report.failed += 1;
    }

    pub fn on_class_end(&mut self, event: &ClassEndEvent) -> bool {
        self.render_entity(&ClassObject::new(event))
    }

    pub fn on_interface_end(&mut self, event: &InterfaceEndEvent) -> bool {
        self.render_entity(&InterfaceObject::new(event))
    }

    pub fn on_trait_end(&mut self, event: &TraitEndEvent) -> bool {
        self.render_entity(&TraitObject::new(event))
    }

    /// Renders the page of one entity. Returns `false` if it was skipped.
    pub fn render_entity(&mut self, object: &dyn ObjectAdapter) -> bool {
        let watermark = self.handles.watermark();
        let result = self.try_render_entity(object);
        self.handles.release(watermark);

        match result {
            Ok(path) => {
                debug!("Rendered '{}'", path.display());
                self.report.rendered += 1;
                true
            }
            Err(e) => {
                error!(
                    "Failed to render {} '{}': {}",
                    object.kind().template_name(),
                    object.object_name(),
                    e
                );
                self.report.failed += 1;
                false
            }
        }
    }

    fn try_render_entity(&self, object: &dyn ObjectAdapter) -> Result<PathBuf, EngineError> {
        let name = object.object_name();
        if name.is_empty() {
            return Err(EngineError::UnnamedObject);
        }
        let kind = object.kind();
        let dir = self.config.output_dir.join(kind.output_subdir());
        ensure_dir(&dir)?;
        let path = dir.join(format!(
            "{}.{}",
            escape_object_name(&name),
            self.config.file_extension
        ));

        let mut data = self.globals.clone();
        data.insert(
            object.var_name().to_string(),
            self.handles.insert(object.value().clone()),
        );
        self.render_to_file(kind.template_name(), &Value::Object(data), &path)?;
        Ok(path)
    }

    /// Renders one of the overview pages to `<output>/<page>.<ext>`.
    pub fn render_page(&mut self, page: &str) -> bool {
        let watermark = self.handles.watermark();
        let path = self.config.page_path(page);
        let result = ensure_dir(&self.config.output_dir).and_then(|()| {
            self.render_to_file(page, &Value::Object(self.globals.clone()), &path)
        });
        self.handles.release(watermark);

        match result {
            Ok(()) => {
                debug!("Rendered page '{}'", path.display());
                self.report.rendered += 1;
                true
            }
            Err(e) => {
                error!("Failed to render page '{}': {}", page, e);
                self.report.failed += 1;
                false
            }
        }
    }

    /// Renders template `<base>.<ext>` with `data` into `path`. Nothing is
    /// left behind at `path` when rendering or writing fails.
    fn render_to_file(&self, base: &str, data: &Value, path: &Path) -> Result<(), EngineError> {
        let template = format!("{}.{}", base, self.config.file_extension);
        if !self.registry.has_template(&template) {
            return Err(EngineError::MissingTemplate(template));
        }
        let output = self.registry.render(&template, data)?;
        if let Err(e) = fs::write(path, output) {
            if path.exists() && fs::remove_file(path).is_err() {
                warn!("Could not remove partial output '{}'", path.display());
            }
            return Err(EngineError::io(path, e));
        }
        Ok(())
    }

    /// Renders the overview pages and copies the template resources.
    pub fn finish(mut self, _event: BuildEndEvent) -> BuildReport {
        for page in PAGES {
            self.render_page(page);
        }

        match &self.config.resource_dir {
            Some(dir) => {
                debug!("Copying resources from '{}'", dir.display());
                let stats = copy_resources(dir, &self.config.output_dir);
                self.report.copied_resources = stats.copied;
                self.report.failed_copies = stats.failed;
            }
            None => debug!("No resource directory configured"),
        }

        debug!("Build finished: {:?}", self.report);
        self.report
    }
}
