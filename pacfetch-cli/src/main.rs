//! Pacfetch CLI - Command-line interface
//!
//! Downloads the packages an installation needs into the target package
//! cache, then exits non-zero if anything is missing.

mod commands;
mod error;
mod logging;
mod ui;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use pacfetch::config::ConfigFile;

use commands::config::ConfigCommands;
use commands::download::DownloadArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "pacfetch")]
#[command(version = pacfetch::VERSION)]
#[command(about = "Pre-download the packages of an installation", long_about = None)]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/pacfetch/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download packages and their dependencies
    Download(DownloadArgs),

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _guard = logging::init(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Download(args) => {
            let config = match &cli.config {
                Some(path) => ConfigFile::load_from(path)?,
                None => ConfigFile::load()?,
            };
            commands::download::run(args, &config)
        }
        Commands::Config { command } => commands::config::run(command, cli.config),
    }
}
