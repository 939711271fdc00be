//! Canopy merge binary
//!
//! Reconstructs tree state from snapshot files: loads one full snapshot,
//! replays any number of incrementals in the order given, and emits the
//! merged state as a full snapshot document on stdout (or to a file).

use canopy::error::SnapshotError;
use canopy::logging::{init_logging, LoggingConfig};
use canopy::snapshot::{parse_full, parse_incremental, SnapshotDocument, SnapshotMerger, SnapshotWriter};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};

const EXIT_PARSE: i32 = 2;
const EXIT_MERGE: i32 = 3;
const EXIT_IO: i32 = 4;

#[derive(Parser)]
#[command(name = "canopy-merge")]
#[command(about = "Merge a full snapshot with incremental snapshots")]
#[command(version)]
struct Cli {
    /// Full snapshot file (the baseline)
    full: PathBuf,

    /// Incremental snapshot files, applied in order
    incrementals: Vec<PathBuf>,

    /// Write the merged snapshot here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the merged snapshot
    #[arg(long, default_value_t = true)]
    pretty: bool,

    /// Enable logging output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default();
    if !cli.verbose {
        logging.level = "off".to_string();
    }
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match run(&cli) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(exit_code(&e));
        }
    }
}

fn run(cli: &Cli) -> Result<(), SnapshotError> {
    let full = parse_full(&read_input(&cli.full)?)?;
    let mut ns = SnapshotMerger::load_full(&full)?;
    info!(path = %cli.full.display(), nodes = ns.node_count(), "loaded full snapshot");

    for path in &cli.incrementals {
        let inc = parse_incremental(&read_input(path)?)?;
        SnapshotMerger::apply(&mut ns, &inc)?;
        debug!(path = %path.display(), "applied incremental snapshot");
    }

    let merged = SnapshotDocument::Full(SnapshotWriter::full(&mut ns));
    let rendered = merged.to_json(cli.pretty)?;
    match &cli.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String, SnapshotError> {
    std::fs::read_to_string(path).map_err(SnapshotError::Io)
}

fn exit_code(err: &SnapshotError) -> i32 {
    match err {
        SnapshotError::InvalidHeader(_) | SnapshotError::Parse(_) => EXIT_PARSE,
        SnapshotError::MissingField { .. } | SnapshotError::Tree(_) => EXIT_MERGE,
        SnapshotError::Io(_) => EXIT_IO,
    }
}
