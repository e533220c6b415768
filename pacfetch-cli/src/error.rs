//! CLI error type.

use pacfetch::config::ConfigError;
use pacfetch::download::InstallError;
use thiserror::Error;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid or unusable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file could not be loaded or saved.
    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    /// The download session failed.
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Logging could not be set up.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl CliError {
    /// Process exit code: 2 for configuration problems, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::ConfigFile(_) => 2,
            CliError::Install(_) | CliError::Logging(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_error_message_is_shown_verbatim() {
        let err = CliError::from(InstallError::DownloadFailed);
        assert_eq!(
            err.to_string(),
            "Can't download needed packages. Installation can't continue."
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_error_prefix() {
        let err = CliError::Config("no packages".to_string());
        assert_eq!(err.to_string(), "Configuration error: no packages");
        assert_eq!(err.exit_code(), 2);
    }
}
