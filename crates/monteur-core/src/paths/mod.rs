//! Path utilities for the per-user data directory and bundled resources.
//!
//! - Data directory: config file, backend log, default database
//! - Resource directory: the packaged backend executable
//! - Backend source root: module search path for development launches
//!
//! Every location can be overridden through an environment variable so
//! tests and portable installs never touch the real user profile.

mod error;
mod files;
mod platform;
mod resolver;

#[cfg(test)]
mod test_utils;

pub use error::PathError;
pub use files::{
    BACKEND_LOG_FILE, PACKAGED_BACKEND_NAME, backend_log_path, config_path, packaged_backend_path,
};
pub use platform::{
    BACKEND_SRC_ENV, DATA_DIR_ENV, RESOURCE_DIR_ENV, backend_source_root, data_root, resource_root,
};
pub use resolver::ResolvedPaths;
