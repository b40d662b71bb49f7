//! Well-known files derived from the root directories.

use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::data_root;
use crate::config::CONFIG_FILE_NAME;

/// Append-mode log receiving the backend's stdout and stderr.
pub const BACKEND_LOG_FILE: &str = "backend.log";

/// Base name of the packaged backend executable.
pub const PACKAGED_BACKEND_NAME: &str = "monteur-backend";

/// Location of the persisted backend config.
pub fn config_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(CONFIG_FILE_NAME))
}

/// Location of the backend log.
pub fn backend_log_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(BACKEND_LOG_FILE))
}

/// Packaged (self-contained) backend executable under `resource_root`.
///
/// Layout: `<resources>/backend/monteur-backend/monteur-backend[.exe]`
pub fn packaged_backend_path(resource_root: &Path) -> PathBuf {
    resource_root
        .join("backend")
        .join(PACKAGED_BACKEND_NAME)
        .join(format!("{PACKAGED_BACKEND_NAME}{}", std::env::consts::EXE_SUFFIX))
}
