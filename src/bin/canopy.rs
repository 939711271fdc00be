//! Canopy interactive shell binary
//!
//! Reads commands from stdin one line at a time and runs them against an
//! in-memory namespace. Command output goes to stdout; a failed command
//! prints its error and the session continues.

use canopy::config::{CanopyConfig, ConfigLoader};
use canopy::logging::{init_logging, LoggingConfig};
use canopy::shell::{Outcome, Shell};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Interactive shell over an in-memory versioned namespace")]
#[command(version)]
struct Cli {
    /// Workspace directory (config lookup and snapshot output)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Explicit configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable logging output
    #[arg(short, long)]
    verbose: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: json, text
    #[arg(long)]
    log_format: Option<String>,

    /// Log output: stdout, stderr
    #[arg(long)]
    log_output: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let config = load_config(&cli);
    let logging_config = build_logging_config(&cli, &config);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("canopy shell starting");

    let mut snapshot = config.snapshot.clone();
    if snapshot.dir.is_relative() {
        snapshot.dir = cli.workspace.join(&snapshot.dir);
    }
    let mut shell = Shell::new(&snapshot);

    let stdin = std::io::stdin();
    loop {
        // Prompt on stderr so piped stdout stays clean.
        eprint!("> ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("read error: {}", e);
                break;
            }
        }
        match shell.execute(&line) {
            Ok(Outcome::Output(text)) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Ok(Outcome::ClearScreen) => {
                print!("\x1b[2J\x1b[H");
                let _ = std::io::stdout().flush();
            }
            Ok(Outcome::Exit) => break,
            Err(e) => eprintln!("error: {}", e),
        }
    }

    info!("canopy shell exiting");
}

fn load_config(cli: &Cli) -> CanopyConfig {
    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(&cli.workspace),
    };
    match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: using default configuration: {}", e);
            CanopyConfig::default()
        }
    }
}

fn build_logging_config(cli: &Cli, config: &CanopyConfig) -> LoggingConfig {
    if !cli.verbose {
        let mut logging = LoggingConfig::default();
        logging.level = "off".to_string();
        return logging;
    }

    let mut logging = config.logging.clone();
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    logging
}
