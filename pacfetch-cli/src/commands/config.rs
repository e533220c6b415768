//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config show` and `config path` for
//! viewing and modifying the configuration file from the command line.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use pacfetch::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., download.backend)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., download.backend)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show all configuration settings
    #[command(alias = "list")]
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against `config_path`, or the default file.
pub fn run(command: ConfigCommands, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Get { key } => run_get(&path, &key),
        ConfigCommands::Set { key, value } => run_set(&path, &key, &value),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'pacfetch config show' to see available keys.",
            key
        ))
    })
}

/// Get a configuration value.
fn run_get(path: &Path, key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load_from(path)?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value.
fn run_set(path: &Path, key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let mut config = ConfigFile::load_from(path)?;
    config_key.set(&mut config, value)?;
    config.save_to(path)?;

    println!("Set {} = {}", config_key.name(), value);
    Ok(())
}

/// Show all configuration settings.
fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    print!("{}", render(&config));
    Ok(())
}

/// Settings grouped by section, INI style.
fn render(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            current_section = section;
        }

        let value = key.get(config);
        let value = if value.is_empty() { "(not set)" } else { value.as_str() };
        out.push_str(&format!("  {} = {}\n", key.key_name(), value));
    }
    out
}
