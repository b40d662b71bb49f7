//! Launch resolution for the backend process.
//!
//! A packaged install ships a self-contained backend executable. Development
//! checkouts run the backend from source through a host interpreter. Both
//! paths receive the same environment so the backend cannot tell which one
//! started it.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use monteur_core::paths::packaged_backend_path;
use monteur_core::{BackendConfig, ResolvedPaths, keys};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fixed port the backend binds to.
pub const BACKEND_PORT: u16 = 8000;

/// Overrides the detected deployment mode (`packaged` or `development`).
pub const DEPLOYMENT_ENV: &str = "MONTEUR_DEPLOYMENT";

/// How the shell was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Installed build with a bundled backend executable.
    Packaged,
    /// Source checkout; the backend runs through an interpreter.
    Development,
}

impl DeploymentMode {
    /// Detect the mode from `MONTEUR_DEPLOYMENT`, falling back to the build profile.
    pub fn detect() -> Self {
        std::env::var(DEPLOYMENT_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(Self::from_build)
    }

    /// Debug builds are development builds.
    pub const fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Packaged
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "packaged" | "production" => Ok(Self::Packaged),
            "development" | "dev" => Ok(Self::Development),
            other => Err(format!("unknown deployment mode: {other}")),
        }
    }
}

/// Host platform, as far as interpreter selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Other,
}

impl Platform {
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Interpreter names to try, in order.
    ///
    /// The Windows launcher alias comes first on Windows.
    pub const fn interpreter_candidates(self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["py", "python"],
            Self::Other => &["python3"],
        }
    }
}

/// Filesystem queries made while resolving a launch.
pub trait FilesystemProbe: Send + Sync {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Locate an executable on `PATH`.
    fn find_on_path(&self, name: &str) -> Option<PathBuf>;
}

/// `FilesystemProbe` backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFilesystem;

impl FilesystemProbe for RealFilesystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Errors that make a launch impossible.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No packaged backend and no interpreter to run the sources with.
    #[error("No backend interpreter found on PATH (tried: {})", .candidates.join(", "))]
    InterpreterNotFound { candidates: Vec<String> },
}

/// Resolved description of how to start the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Executable to run.
    pub command: PathBuf,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Complete child environment. Inherited values are passed through as-is,
    /// including ones that are not valid UTF-8.
    pub env: BTreeMap<OsString, OsString>,
}

impl LaunchPlan {
    /// Human-readable command line for logs.
    pub fn display_command(&self) -> String {
        let mut line = self.command.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Produces a fresh `LaunchPlan` for every start.
pub trait LaunchPlanner: Send + Sync {
    fn plan(&self, config: &BackendConfig) -> Result<LaunchPlan, LaunchError>;
}

/// Inputs the resolver needs besides the config record.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub mode: DeploymentMode,
    pub platform: Platform,
    /// Location of the bundled backend executable.
    pub packaged_executable: PathBuf,
    /// Backend source root, put on the module search path.
    pub source_root: PathBuf,
    /// Writable directory exposed to the backend for its own logs.
    pub log_dir: PathBuf,
    pub port: u16,
}

impl LaunchSettings {
    /// Settings for the current host from resolved paths.
    pub fn from_paths(paths: &ResolvedPaths, mode: DeploymentMode) -> Self {
        Self {
            mode,
            platform: Platform::current(),
            packaged_executable: packaged_backend_path(&paths.resource_root),
            source_root: paths.source_root.clone(),
            log_dir: paths.data_root.clone(),
            port: BACKEND_PORT,
        }
    }
}

/// Inline program that builds and serves the backend app.
fn startup_expression(port: u16) -> String {
    format!(
        "from ai_service.main import create_fastapi_app; app = create_fastapi_app(); \
         import uvicorn; uvicorn.run(app, host='127.0.0.1', port={port})"
    )
}

/// Decides between the packaged executable and the interpreter invocation.
pub struct LaunchResolver<F = RealFilesystem> {
    settings: LaunchSettings,
    fs: F,
    /// Fixed base environment; `None` reads this process's environment on
    /// every resolve.
    inherited: Option<BTreeMap<OsString, OsString>>,
}

impl LaunchResolver<RealFilesystem> {
    /// Resolver over the real filesystem, inheriting this process's environment.
    pub fn new(settings: LaunchSettings) -> Self {
        Self::with_probe(settings, RealFilesystem)
    }
}

impl<F: FilesystemProbe> LaunchResolver<F> {
    /// Resolver over a custom filesystem probe.
    pub fn with_probe(settings: LaunchSettings, fs: F) -> Self {
        Self {
            settings,
            fs,
            inherited: None,
        }
    }

    /// Use `env` instead of this process's environment as the base layer.
    #[must_use]
    pub fn with_inherited_env(mut self, env: BTreeMap<OsString, OsString>) -> Self {
        self.inherited = Some(env);
        self
    }

    pub const fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    /// Resolve the plan for `config`.
    pub fn resolve(&self, config: &BackendConfig) -> Result<LaunchPlan, LaunchError> {
        let env = self.environment(config);

        if self.settings.mode == DeploymentMode::Packaged {
            if self.packaged_present() {
                info!(
                    command = %self.settings.packaged_executable.display(),
                    "Launching packaged backend"
                );
                return Ok(LaunchPlan {
                    command: self.settings.packaged_executable.clone(),
                    args: Vec::new(),
                    env,
                });
            }
            warn!(
                path = %self.settings.packaged_executable.display(),
                "Packaged backend missing, falling back to interpreter"
            );
        }

        let command = self.find_interpreter()?;
        info!(command = %command.display(), port = %self.settings.port, "Launching backend from source");
        Ok(LaunchPlan {
            command,
            args: vec!["-c".to_string(), startup_expression(self.settings.port)],
            env,
        })
    }

    fn packaged_present(&self) -> bool {
        match self.fs.exists(&self.settings.packaged_executable) {
            Ok(present) => present,
            Err(e) => {
                warn!(
                    path = %self.settings.packaged_executable.display(),
                    error = %e,
                    "Cannot check packaged backend, treating as absent"
                );
                false
            }
        }
    }

    fn find_interpreter(&self) -> Result<PathBuf, LaunchError> {
        let candidates = self.settings.platform.interpreter_candidates();
        for name in candidates {
            if let Some(path) = self.fs.find_on_path(name) {
                return Ok(path);
            }
            debug!(interpreter = %name, "Interpreter not on PATH");
        }
        Err(LaunchError::InterpreterNotFound {
            candidates: candidates.iter().map(ToString::to_string).collect(),
        })
    }

    /// Inherited environment, overlaid by the config, overlaid by the injected paths.
    fn environment(&self, config: &BackendConfig) -> BTreeMap<OsString, OsString> {
        let mut env = self
            .inherited
            .clone()
            .unwrap_or_else(|| std::env::vars_os().collect());
        env.extend(config.iter().map(|(k, v)| (k.into(), v.into())));
        env.insert(
            keys::MODULE_PATH.into(),
            self.settings.source_root.clone().into_os_string(),
        );
        env.insert(
            keys::LOG_DIR.into(),
            self.settings.log_dir.clone().into_os_string(),
        );
        env
    }
}

impl<F: FilesystemProbe> LaunchPlanner for LaunchResolver<F> {
    fn plan(&self, config: &BackendConfig) -> Result<LaunchPlan, LaunchError> {
        self.resolve(config)
    }
}
