//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the supervisor is wired together:
//! - Path resolution and the JSON config store (via monteur-core)
//! - Launch resolver, readiness probe and broadcaster (via monteur-runtime)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use monteur_core::{JsonConfigStore, ResolvedPaths};
use monteur_runtime::probe::{DEFAULT_READY_TIMEOUT, HttpHealthCheck};
use monteur_runtime::{
    BACKEND_PORT, BackendSupervisor, DeploymentMode, LaunchResolver, LaunchSettings,
    ReadinessProbe, StatusBroadcaster, SupervisorDeps,
};
use tracing::debug;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub mode: DeploymentMode,
    pub ready_timeout: Duration,
}

impl CliConfig {
    /// Detected deployment mode and the standard readiness deadline.
    pub fn with_defaults() -> Self {
        Self {
            mode: DeploymentMode::detect(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

/// Fully composed context for the `run` command.
pub struct CliContext {
    pub paths: ResolvedPaths,
    pub store: Arc<JsonConfigStore>,
    pub broadcaster: StatusBroadcaster,
    pub supervisor: BackendSupervisor,
}

/// Config store for the resolved data directory.
pub fn config_store(paths: &ResolvedPaths) -> JsonConfigStore {
    JsonConfigStore::new(&paths.data_root)
}

/// Compose the supervisor and its collaborators.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext> {
    let paths = ResolvedPaths::resolve()?;
    debug!(mode = ?config.mode, data_root = %paths.data_root.display(), "Bootstrapping supervisor");

    let store = Arc::new(config_store(&paths));
    let broadcaster = StatusBroadcaster::new();
    let resolver = LaunchResolver::new(LaunchSettings::from_paths(&paths, config.mode));
    let readiness = ReadinessProbe::new(Arc::new(HttpHealthCheck::new(BACKEND_PORT)?));

    let supervisor = BackendSupervisor::new(SupervisorDeps {
        config_store: store.clone(),
        planner: Arc::new(resolver),
        readiness,
        status: Arc::new(broadcaster.clone()),
        log_path: paths.backend_log.clone(),
        ready_timeout: config.ready_timeout,
    });

    Ok(CliContext {
        paths,
        store,
        broadcaster,
        supervisor,
    })
}
