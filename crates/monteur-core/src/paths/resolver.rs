//! Every resolved path captured in one struct.
//!
//! Used by the CLI `paths` command and by the composition root so a single
//! resolution pass feeds both the config store and the launcher.

use std::path::PathBuf;

use super::{
    PathError, backend_log_path, backend_source_root, config_path, data_root,
    packaged_backend_path, resource_root,
};

/// All resolved paths captured in a single struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Per-user data directory (config, log, database)
    pub data_root: PathBuf,
    /// Bundled resources directory
    pub resource_root: PathBuf,
    /// Backend source root for development launches
    pub source_root: PathBuf,
    /// Persisted config file
    pub config_file: PathBuf,
    /// Backend stdout/stderr log
    pub backend_log: PathBuf,
    /// Packaged backend executable (may not exist)
    pub packaged_backend: PathBuf,
}

impl ResolvedPaths {
    /// Resolve all paths using the current environment.
    pub fn resolve() -> Result<Self, PathError> {
        let resource_root = resource_root()?;
        Ok(Self {
            data_root: data_root()?,
            packaged_backend: packaged_backend_path(&resource_root),
            resource_root,
            source_root: backend_source_root()?,
            config_file: config_path()?,
            backend_log: backend_log_path()?,
        })
    }
}

impl std::fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "data_root = {}", self.data_root.display())?;
        writeln!(f, "resource_root = {}", self.resource_root.display())?;
        writeln!(f, "source_root = {}", self.source_root.display())?;
        writeln!(f, "config_file = {}", self.config_file.display())?;
        writeln!(f, "backend_log = {}", self.backend_log.display())?;
        write!(f, "packaged_backend = {}", self.packaged_backend.display())
    }
}
