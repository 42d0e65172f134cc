// src/engine/config.rs
use crate::error::ConfigError;
use crate::wrapper::XmlWrapper;
use log::LevelFilter;
use std::path::PathBuf;

/// The two directories every other path is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// Installation directory, holding the bundled templates.
    pub home: PathBuf,
    /// Scratch directory for caches, logs and default output.
    pub work: PathBuf,
}

impl ProjectPaths {
    pub fn new(home: impl Into<PathBuf>, work: impl Into<PathBuf>) -> Self {
        ProjectPaths {
            home: home.into(),
            work: work.into(),
        }
    }

    /// Relative paths are taken relative to the home directory.
    fn resolve(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if path.is_relative() { self.home.join(path) } else { path }
    }
}

/// Settings of the render orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub template_dir: PathBuf,
    /// Copied into the output root after all pages; `None` skips the copy.
    pub resource_dir: Option<PathBuf>,
    /// `Some` keeps templates compiled in memory for the whole build; the
    /// directory itself is only logged, nothing is written there. `None`
    /// re-reads every template from disk on each render.
    pub cache_dir: Option<PathBuf>,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub file_extension: String,
    pub output_dir: PathBuf,
}

impl EngineConfig {
    pub fn builder(paths: ProjectPaths) -> EngineConfigBuilder {
        EngineConfigBuilder::new(paths)
    }

    /// Reads the engine element of a project configuration:
    ///
    /// ```xml
    /// <build engine="html" output="docs">
    ///   <template path="templates/html"/>
    ///   <resource path="templates/html/resources"/>
    ///   <cache path=""/>
    ///   <log path="build.log" level="info"/>
    ///   <file extension="xhtml"/>
    /// </build>
    /// ```
    ///
    /// Every element is optional.
    pub fn from_xml(engine: &XmlWrapper, paths: &ProjectPaths) -> Result<Self, ConfigError> {
        let setting = |element: &str, name: &str| {
            engine
                .get(element)
                .and_then(|e| e.get(name))
                .map(|value| value.as_text())
        };

        let mut builder = EngineConfigBuilder::new(paths.clone());
        if let Some(path) = setting("template", "path") {
            builder = builder.with_template_dir(path);
        }
        if let Some(path) = setting("resource", "path") {
            builder = builder.with_resource_dir(path);
        }
        if let Some(path) = setting("cache", "path") {
            builder = builder.with_cache_dir(path);
        }
        if let Some(path) = setting("log", "path") {
            builder = builder.with_log_file(path);
        }
        if let Some(level) = setting("log", "level") {
            builder = builder.with_log_level(parse_log_level(&level)?);
        }
        if let Some(extension) = setting("file", "extension") {
            builder = builder.with_file_extension(extension);
        }
        if let Some(output) = engine.get("output") {
            builder = builder.with_output_dir(output.as_text());
        }
        Ok(builder.build())
    }

    /// Path of the page rendered for `name` directly below the output root.
    pub fn page_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", name, self.file_extension))
    }
}

/// Maps syslog-style level names onto `log` levels.
pub fn parse_log_level(level: &str) -> Result<LevelFilter, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" | "notice" => Ok(LevelFilter::Info),
        "warning" | "warn" => Ok(LevelFilter::Warn),
        "error" | "critical" | "alert" | "emergency" => Ok(LevelFilter::Error),
        _ => Err(ConfigError::InvalidLogLevel(level.to_string())),
    }
}

/// Builds an [`EngineConfig`]; unset options fall back to their defaults.
pub struct EngineConfigBuilder {
    paths: ProjectPaths,
    template_dir: Option<PathBuf>,
    resource_dir: Option<Option<PathBuf>>,
    cache_dir: Option<Option<PathBuf>>,
    log_file: Option<PathBuf>,
    log_level: LevelFilter,
    file_extension: String,
    output_dir: Option<PathBuf>,
}

impl EngineConfigBuilder {
    pub fn new(paths: ProjectPaths) -> Self {
        EngineConfigBuilder {
            paths,
            template_dir: None,
            resource_dir: None,
            cache_dir: None,
            log_file: None,
            log_level: LevelFilter::Warn,
            file_extension: "html".to_string(),
            output_dir: None,
        }
    }

    pub fn with_template_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(self.paths.resolve(path));
        self
    }

    /// An empty path disables the resource copy.
    pub fn with_resource_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.resource_dir = Some(self.optional_dir(path.into()));
        self
    }

    /// A non-empty path keeps templates compiled for the whole build and is
    /// only logged. An empty path turns on Handlebars dev mode, which re-reads
    /// each template file on every render.
    pub fn with_cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(self.optional_dir(path.into()));
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(self.paths.resolve(path));
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(self.paths.resolve(path));
        self
    }

    fn optional_dir(&self, path: PathBuf) -> Option<PathBuf> {
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(self.paths.resolve(path))
        }
    }

    pub fn build(self) -> EngineConfig {
        let work = self.paths.work.join("handlebars");
        let template_dir = self
            .template_dir
            .unwrap_or_else(|| self.paths.home.join("templates").join("handlebars"));
        let resource_dir = self
            .resource_dir
            .unwrap_or_else(|| Some(template_dir.join("resources")));

        EngineConfig {
            resource_dir,
            cache_dir: self.cache_dir.unwrap_or_else(|| Some(work.join("cache"))),
            log_file: self.log_file.unwrap_or_else(|| work.join("build.log")),
            log_level: self.log_level,
            file_extension: self.file_extension,
            output_dir: self.output_dir.unwrap_or_else(|| self.paths.work.join("docs")),
            template_dir,
        }
    }
}
