//! Failures while locating Monteur's directories.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    /// The platform reports no per-user data directory.
    #[error("no per-user data directory on this platform; set MONTEUR_DATA_DIR")]
    NoDataDir,

    #[error("cannot create data directory {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The running executable has no usable location, so bundled
    /// resources cannot be found next to it.
    #[error("cannot locate the running executable: {0}")]
    Executable(#[source] io::Error),

    #[error("executable {0} has no parent directory")]
    ExecutableParent(PathBuf),

    #[error("cannot read the working directory: {0}")]
    WorkingDir(#[source] io::Error),
}
