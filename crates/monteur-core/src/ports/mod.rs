//! Port definitions (trait abstractions) for the supervisor's collaborators.
//!
//! Ports define the interfaces the runtime expects from the shell around it.
//! They contain no implementation details and use only domain types.

pub mod config_store;
pub mod status_emitter;

pub use config_store::ConfigStore;
pub use status_emitter::StatusEmitter;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or persisting the backend configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not a JSON object of scalar values.
    #[error("Config file {path} is not valid: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The record could not be encoded for writing.
    #[error("Failed to encode config for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The data directory could not be resolved.
    #[error(transparent)]
    Path(#[from] crate::paths::PathError),
}
