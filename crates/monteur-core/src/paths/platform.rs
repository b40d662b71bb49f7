//! Root directory resolution.

use std::env;
use std::fs;
use std::path::PathBuf;

use super::error::PathError;

/// Overrides the per-user data directory.
pub const DATA_DIR_ENV: &str = "MONTEUR_DATA_DIR";
/// Overrides the directory holding bundled resources.
pub const RESOURCE_DIR_ENV: &str = "MONTEUR_RESOURCE_DIR";
/// Overrides the backend source root used for development launches.
pub const BACKEND_SRC_ENV: &str = "MONTEUR_BACKEND_SRC";

/// Application directory name under the system data directory.
const APP_DIR_NAME: &str = "Monteur IA";

/// Get the per-user data directory, creating it if needed.
///
/// Resolution order:
/// 1. `MONTEUR_DATA_DIR` environment variable
/// 2. System data directory (e.g. `%APPDATA%\Monteur IA`, `~/.local/share/Monteur IA`)
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = match env::var_os(DATA_DIR_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::data_dir()
            .ok_or(PathError::NoDataDir)?
            .join(APP_DIR_NAME),
    };

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateDataDir {
            path: root.clone(),
            source: e,
        })?;
    }

    Ok(root)
}

/// Get the directory holding bundled resources.
///
/// Resolution order:
/// 1. `MONTEUR_RESOURCE_DIR` environment variable
/// 2. Directory containing the running executable
pub fn resource_root() -> Result<PathBuf, PathError> {
    if let Some(path) = env::var_os(RESOURCE_DIR_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let exe = env::current_exe().map_err(PathError::Executable)?;
    exe.parent()
        .map(std::path::Path::to_path_buf)
        .ok_or_else(|| PathError::ExecutableParent(exe.clone()))
}

/// Get the backend source root put on the module search path.
///
/// Resolution order:
/// 1. `MONTEUR_BACKEND_SRC` environment variable
/// 2. `src` under the current working directory
pub fn backend_source_root() -> Result<PathBuf, PathError> {
    if let Some(path) = env::var_os(BACKEND_SRC_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    env::current_dir()
        .map(|cwd| cwd.join("src"))
        .map_err(PathError::WorkingDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::EnvScope;
    use tempfile::tempdir;

    #[test]
    fn data_root_honors_override_and_creates_it() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("profile");
        let mut env = EnvScope::new();
        env.set(DATA_DIR_ENV, &target);

        let root = data_root().unwrap();

        assert_eq!(root, target);
        assert!(root.is_dir());
    }

    #[test]
    fn resource_root_honors_override() {
        let mut env = EnvScope::new();
        env.set(RESOURCE_DIR_ENV, "/opt/monteur/resources");

        assert_eq!(
            resource_root().unwrap(),
            PathBuf::from("/opt/monteur/resources")
        );
    }

    #[test]
    fn source_root_defaults_to_cwd_src() {
        let mut env = EnvScope::new();
        env.unset(BACKEND_SRC_ENV);

        let root = backend_source_root().unwrap();
        assert!(root.ends_with("src"));
    }
}
