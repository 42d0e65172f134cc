use chrono::Local;
use clap::Parser;
use doxweave::collector::CollectorDir;
use doxweave::engine::{Engine, EngineConfig, ProjectPaths};
use doxweave::wrapper::{CONFIG_NAMESPACE, XmlWrapper};
use doxweave::{BuildEndEvent, BuildReport, EngineError};
use doxweave_dom::{Document, NodeKey};
use log::{error, info};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Render collector XML into documentation pages", long_about = None)]
struct Args {
    /// Directory holding index.xml, source.xml and the per-unit XML files
    xml_dir: PathBuf,

    /// Project configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Installation directory; relative configuration paths start here
    #[arg(long, default_value = ".")]
    home: PathBuf,

    /// Working directory for caches, logs and default output
    #[arg(long, default_value = "build")]
    work: PathBuf,

    /// Output directory, overriding the configuration
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to print build report: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<BuildReport, EngineError> {
    let paths = ProjectPaths::new(&args.home, &args.work);
    let config_doc = match &args.config {
        Some(path) => Arc::new(Document::from_file(path)?),
        None => Arc::new(Document::parse(&format!(r#"<project xmlns="{}"/>"#, CONFIG_NAMESPACE))?),
    };

    // The configuration may be a full `<phpdox>` file or a bare `<project>`.
    let root = XmlWrapper::from_document(Arc::clone(&config_doc), CONFIG_NAMESPACE);
    let project = match root.name().as_deref() {
        Some("project") => root,
        _ => root.get("project").unwrap_or(root),
    };
    let engine_element = project.get("generator").and_then(|g| g.get("build"));

    let mut config = match &engine_element {
        Some(element) => EngineConfig::from_xml(element, &paths)?,
        None => EngineConfig::builder(paths).build(),
    };
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    init_logging(&config)?;
    info!("Rendering '{}' into '{}'", args.xml_dir.display(), config.output_dir.display());

    let collector = CollectorDir::new(&args.xml_dir);
    let mut event = collector.start_event(config_doc)?;
    if let Some(NodeKey::Node(id)) = project.keys().first() {
        event = event.with_project(*id);
    }

    let mut build = Engine::new(config).start(event)?;
    collector.replay(&mut build)?;
    Ok(build.finish(BuildEndEvent))
}

/// Sends log records to the configured log file, emptied at the start of
/// every build.
fn init_logging(config: &EngineConfig) -> Result<(), EngineError> {
    let io_error = |source| EngineError::Io {
        path: config.log_file.clone(),
        source,
    };
    if let Some(parent) = config.log_file.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = fs::File::create(&config.log_file).map_err(io_error)?;

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [doxweave] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
    Ok(())
}
