//! Stockflow Sync CLI
//!
//! Usage:
//!   stockflow-sync [OPTIONS] <NEW>
//!
//! Options:
//!   -o, --old <FILE>      Previous component list; operations are relative to it
//!   -m, --models <DIR>    Directory of static model files (`<model_id>.json`)
//!   -c, --config <FILE>   Geometry configuration (TOML format)
//!   -r, --routing <MODE>  Flow routing mode: straight or angle
//!   -a, --arrows          Print the arrow path of every pointer
//!   -l, --lint            Run lint checks on the new list
//!   -v, --verbose         Increase log verbosity (repeatable)
//!   -h, --help            Print help

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::Level;

use stockflow_sync::lint;
use stockflow_sync::{
    parse_records, Component, CycleReport, GeometryConfig, ModelDirectory, RoutingMode, Session,
};

#[derive(Parser)]
#[command(name = "stockflow-sync")]
#[command(about = "Reconcile stock-and-flow component lists and compute connector geometry")]
struct Cli {
    /// Component list to reconcile (JSON array of records)
    new: PathBuf,

    /// Previous component list; operations are relative to it
    #[arg(short, long)]
    old: Option<PathBuf>,

    /// Directory of static model files (`<model_id>.json`)
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Geometry configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Flow routing mode: straight or angle
    #[arg(short, long)]
    routing: Option<RoutingMode>,

    /// Print the arrow path of every pointer
    #[arg(short, long)]
    arrows: bool,

    /// Run lint checks on the new list
    #[arg(short, long)]
    lint: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => match GeometryConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => GeometryConfig::default(),
    };
    if let Some(routing) = cli.routing {
        config = config.with_flow_routing(routing);
    }

    let mut session = Session::new(config);
    let mut loader = cli.models.as_ref().map(ModelDirectory::new);

    if let Some(old) = &cli.old {
        let components = read_components(old);
        match loader.as_mut() {
            Some(loader) => session.sync_with_loader(components, loader),
            None => session.receive(components),
        };
    }

    let components = read_components(&cli.new);
    let report = match loader.as_mut() {
        Some(loader) => session.sync_with_loader(components, loader),
        None => session.receive(components),
    };
    print_report(&report);

    if cli.arrows {
        print_arrows(&session);
    }

    if cli.lint {
        for warning in lint::check(session.collection()) {
            eprintln!("warning[{}]: {}: {}", warning.category, warning.id, warning.message);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read and decode a component list, reporting bad records and skipping them
fn read_components(path: &Path) -> Vec<Component> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    };

    match parse_records(&content) {
        Ok(batch) => {
            for err in &batch.errors {
                eprintln!("{}: skipped {}", path.display(), err);
            }
            batch.components
        }
        Err(e) => {
            eprintln!("Error parsing '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn print_report(report: &CycleReport) {
    for operation in &report.operations {
        println!("{}", operation);
    }
    for id in &report.orphaned {
        println!("orphaned {}", id);
    }
    for model_id in &report.load_requests {
        println!("load {}", model_id);
    }
    for diagnostic in &report.diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn print_arrows(session: &Session) {
    let geometry = session.geometry();
    for pointer in session.flattened().pointer_components() {
        let path = geometry
            .arrow_points(pointer)
            .iter()
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" -> ");
        println!("{}: {}", pointer.id(), path);
    }
}
