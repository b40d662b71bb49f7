//! CLI-specific error types and exit code mapping.

use monteur_core::{ConfigError, PathError};
use monteur_runtime::SupervisorError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend could not be launched.
    #[error("Launch error: {0}")]
    Launch(String),

    /// Process execution error.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Invalid arguments, reported by clap before dispatch
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 74,         // EX_IOERR
            Self::Config(_) => 78,     // EX_CONFIG
            Self::Launch(_) => 69,     // EX_UNAVAILABLE
            Self::Process(_) => 71,    // EX_OSERR
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { .. } | ConfigError::Serialize { .. } => Self::Io(err.to_string()),
            ConfigError::Parse { .. } | ConfigError::Path(_) => Self::Config(err.to_string()),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::Config(config_err) => config_err.into(),
            SupervisorError::Launch(_) => Self::Launch(err.to_string()),
            SupervisorError::LogSink { .. } => Self::Io(err.to_string()),
            SupervisorError::Spawn { .. } => Self::Process(err.to_string()),
        }
    }
}

/// Exit code for an error returned from a command.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}
