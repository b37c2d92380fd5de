//! Trialgate command-line entry point
//!
//! - `process`: validate a folder of data files and route each to the archive
//!   or rejected area
//! - `gen-sample`: write a known-good data file

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use trialgate::TrialgateConfig;
use trialgate_logging::{init_logging, LogConfig};

mod cli;

#[derive(Parser, Debug)]
#[command(name = "trialgate", about = "Validate and archive clinical-trial CSV drops")]
struct Cli {
    /// Enable verbose output (per-file status lines, info logs on stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(long, global = true, env = "TRIALGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every file in a folder
    Process {
        /// Folder to process (default: configured incoming folder)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Validate and log only; no seen-store writes, no moves
        #[arg(long)]
        dry_run: bool,

        /// Record accepted digests but leave files where they are
        #[arg(long)]
        no_move: bool,

        /// Override the archive root for this run
        #[arg(long)]
        archive_path: Option<PathBuf>,
    },

    /// Generate a valid sample data file
    GenSample {
        /// File name (default: MED_DATA_<now>.csv)
        #[arg(long)]
        sample_name: Option<String>,
    },
}

/// What the process should report to its caller.
enum Status {
    Clean,
    Invalid,
}

fn load_settings(path: Option<&Path>) -> Result<TrialgateConfig> {
    TrialgateConfig::load_or_default(path).map_err(|err| {
        let shown = path.unwrap_or_else(|| Path::new("<defaults>"));
        anyhow::Error::from(cli::error::HelpfulError::bad_config(shown, &err.to_string()))
    })
}

fn run_command(cli: Cli, settings: &TrialgateConfig) -> Result<Status> {
    match cli.command {
        Commands::Process {
            path,
            dry_run,
            no_move,
            archive_path,
        } => {
            let summary = cli::process::run(
                settings,
                cli::process::ProcessArgs {
                    path,
                    dry_run,
                    no_move,
                    archive_path,
                    verbose: cli.verbose,
                },
            )?;
            Ok(if summary.has_failures() {
                Status::Invalid
            } else {
                Status::Clean
            })
        }
        Commands::GenSample { sample_name } => {
            cli::sample::run(settings, sample_name)?;
            Ok(Status::Clean)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(1);
        }
    };

    let _log_guard = match init_logging(LogConfig {
        app_name: "trialgate",
        verbose: cli.verbose,
        log_dir: &settings.log_dir,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: {:#}", err);
            None
        }
    };

    match run_command(cli, &settings) {
        Ok(Status::Clean) => ExitCode::SUCCESS,
        Ok(Status::Invalid) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
