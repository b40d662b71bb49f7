//! Backend supervisor: owns the single backend child process.
//!
//! The supervisor owns its state internally behind a `tokio::sync::Mutex`.
//! Surfaces (desktop shell, CLI) call methods on a cloned handle and never
//! hold process handles themselves.
//!
//! Key design decisions:
//! - **Generation identity**: every spawn gets a generation number; late
//!   probe results and exit notifications for an older generation are dropped
//! - **Observer owns the child**: one task per spawn waits on the child and
//!   is the only place it is terminated and reaped
//! - **Serialized restarts**: config-triggered and operator restarts queue
//!   on a dedicated lock so their stop/start pairs never interleave

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Weak};
use std::time::Duration;

use monteur_core::{BackendConfig, ConfigError, ConfigStore, StatusEmitter, StatusEvent};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::launch::{LaunchError, LaunchPlan, LaunchPlanner};
use crate::probe::ReadinessProbe;
use crate::shutdown::{TERM_GRACE, exit_signal, terminate_child};

/// How long `shutdown` waits for the observer to reap the child.
const REAP_TIMEOUT: Duration = Duration::from_secs(7);

/// Lifecycle state of the supervised backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    Stopped,
    Starting,
    Ready,
    /// Readiness timed out; the process is still tracked.
    Failed,
}

/// Result of a `start` call that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    /// The backend passed its readiness probe.
    Ok,
    /// A backend was already tracked; nothing was spawned.
    AlreadyRunning,
    /// The readiness deadline elapsed; the process keeps running.
    Timeout,
    /// The process was stopped or exited before the probe resolved.
    Superseded,
    /// `shutdown` has begun; nothing was spawned.
    Closed,
}

/// Point-in-time view of the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorSnapshot {
    pub state: SupervisorState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_exit_code: Option<i32>,
}

/// Errors surfaced synchronously by supervisor operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend log could not be opened or written.
    #[error("Failed to open backend log {path}: {source}")]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS refused to create the process.
    #[error("Failed to spawn backend {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Collaborators and settings for a `BackendSupervisor`.
pub struct SupervisorDeps {
    pub config_store: Arc<dyn ConfigStore>,
    pub planner: Arc<dyn LaunchPlanner>,
    pub readiness: ReadinessProbe,
    pub status: Arc<dyn StatusEmitter>,
    /// Append-mode log receiving the backend's stdout and stderr.
    pub log_path: PathBuf,
    pub ready_timeout: Duration,
}

/// The process currently owned by the supervisor.
struct Tracked {
    generation: u64,
    pid: Option<u32>,
    /// Dropping this asks the observer to terminate the child.
    stop: DropGuard,
    observer: JoinHandle<()>,
}

struct Inner {
    tracked: Option<Tracked>,
    state: SupervisorState,
    last_exit_code: Option<i32>,
    next_generation: u64,
    /// Set by `shutdown`; no spawn happens afterwards.
    closed: bool,
}

struct Shared {
    deps: SupervisorDeps,
    inner: Mutex<Inner>,
    restart_lock: Mutex<()>,
}

/// Supervisor for the backend process.
///
/// Cheap to clone; all clones drive the same backend.
///
/// # Example
///
/// ```ignore
/// let supervisor = BackendSupervisor::new(deps);
/// supervisor.boot().await?;
/// supervisor.apply_config(edited).await?;
/// supervisor.shutdown().await;
/// ```
#[derive(Clone)]
pub struct BackendSupervisor {
    shared: Arc<Shared>,
}

impl BackendSupervisor {
    pub fn new(deps: SupervisorDeps) -> Self {
        Self {
            shared: Arc::new(Shared {
                deps,
                inner: Mutex::new(Inner {
                    tracked: None,
                    state: SupervisorState::Stopped,
                    last_exit_code: None,
                    next_generation: 1,
                    closed: false,
                }),
                restart_lock: Mutex::new(()),
            }),
        }
    }

    /// Start the backend and wait for readiness.
    ///
    /// Returns `AlreadyRunning` without spawning when a process is tracked.
    /// Launch and spawn failures are returned here, never as crash events.
    pub async fn start(&self) -> Result<StartOutcome, SupervisorError> {
        let (generation, stopped) = {
            let mut inner = self.shared.inner.lock().await;
            if inner.closed {
                debug!("Supervisor shut down, not starting backend");
                return Ok(StartOutcome::Closed);
            }
            if let Some(tracked) = &inner.tracked {
                debug!(pid = ?tracked.pid, generation = %tracked.generation, "Backend already running");
                return Ok(StartOutcome::AlreadyRunning);
            }

            let config = self.shared.deps.config_store.load().await?;
            self.spawn_locked(&mut inner, &config).await?
        };

        self.shared.deps.status.publish(StatusEvent::starting());
        let readiness = &self.shared.deps.readiness;
        let ready = tokio::select! {
            ready = readiness.wait(self.shared.deps.ready_timeout) => ready,
            // Stop or exit: the result would be stale anyway
            () = stopped.cancelled() => false,
        };

        let mut inner = self.shared.inner.lock().await;
        if inner.tracked.as_ref().map(|t| t.generation) != Some(generation) {
            debug!(generation = %generation, "Discarding readiness result of a replaced backend");
            return Ok(StartOutcome::Superseded);
        }

        if ready {
            inner.state = SupervisorState::Ready;
            Ok(StartOutcome::Ok)
        } else {
            warn!(
                generation = %generation,
                timeout_ms = %self.shared.deps.ready_timeout.as_millis(),
                "Backend not ready in time, leaving it running"
            );
            inner.state = SupervisorState::Failed;
            Ok(StartOutcome::Timeout)
        }
    }

    /// Stop the tracked backend, if any.
    ///
    /// Returns immediately; the exit observer terminates and reaps the child.
    pub async fn stop(&self) -> bool {
        self.take_tracked().await.is_some()
    }

    /// Initial start at application launch, publishing the result.
    pub async fn boot(&self) -> Result<StartOutcome, SupervisorError> {
        let result = self.start().await;
        self.publish_result(&result).await;
        result
    }

    /// Persist `config` and restart the backend with it.
    ///
    /// A failed save still restarts the backend from the stored record and
    /// the save error is returned afterwards.
    pub async fn apply_config(
        &self,
        config: BackendConfig,
    ) -> Result<StartOutcome, SupervisorError> {
        let _serial = self.shared.restart_lock.lock().await;
        info!(keys = config.len(), "Applying backend config");

        self.stop_and_reap().await;
        let saved = self.shared.deps.config_store.save(&config).await;
        if let Err(e) = &saved {
            error!(error = %e, "Failed to save backend config, restarting with stored config");
        }

        let result = self.start().await;
        self.publish_result(&result).await;
        saved?;
        result
    }

    /// Operator-triggered stop/start with the stored config.
    pub async fn restart(&self) -> Result<StartOutcome, SupervisorError> {
        let _serial = self.shared.restart_lock.lock().await;
        info!("Restarting backend");

        self.stop_and_reap().await;
        let result = self.start().await;
        self.publish_result(&result).await;
        result
    }

    /// Stop the backend and wait, bounded, for it to be reaped.
    ///
    /// Terminal: later starts return `Closed`. An in-flight restart or
    /// config apply is awaited so nothing it spawns outlives this call.
    pub async fn shutdown(&self) {
        self.shared.inner.lock().await.closed = true;
        self.stop_and_reap().await;
        let _serial = self.shared.restart_lock.lock().await;
    }

    pub async fn snapshot(&self) -> SupervisorSnapshot {
        let inner = self.shared.inner.lock().await;
        SupervisorSnapshot {
            state: inner.state,
            pid: inner.tracked.as_ref().and_then(|t| t.pid),
            last_exit_code: inner.last_exit_code,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.shared.inner.lock().await.tracked.is_some()
    }

    async fn take_tracked(&self) -> Option<JoinHandle<()>> {
        let mut inner = self.shared.inner.lock().await;
        let Tracked {
            generation,
            pid,
            stop,
            observer,
        } = inner.tracked.take()?;
        inner.state = SupervisorState::Stopped;
        drop(inner);

        info!(pid = ?pid, generation = %generation, "Stopping backend");
        drop(stop);
        Some(observer)
    }

    async fn stop_and_reap(&self) {
        let Some(observer) = self.take_tracked().await else {
            return;
        };
        if tokio::time::timeout(REAP_TIMEOUT, observer).await.is_err() {
            warn!(
                timeout_ms = %REAP_TIMEOUT.as_millis(),
                "Backend was not reaped in time"
            );
        }
    }

    async fn publish_result(&self, result: &Result<StartOutcome, SupervisorError>) {
        let event = match result {
            Ok(StartOutcome::Ok) => Some(StatusEvent::ready()),
            Ok(StartOutcome::Timeout) => Some(StatusEvent::timeout()),
            // Whoever replaced the process reports its own outcome
            Ok(StartOutcome::Superseded | StartOutcome::Closed) => None,
            Ok(StartOutcome::AlreadyRunning) => match self.snapshot().await.state {
                SupervisorState::Ready => Some(StatusEvent::ready()),
                SupervisorState::Failed => Some(StatusEvent::timeout()),
                SupervisorState::Starting => Some(StatusEvent::starting()),
                SupervisorState::Stopped => None,
            },
            Err(e) => Some(StatusEvent::launch_failed(e.to_string())),
        };

        if let Some(event) = event {
            self.shared.deps.status.publish(event);
        }
    }

    /// Spawn a new backend. Caller holds the state lock.
    ///
    /// Returns the new generation and a token cancelled once it is untracked.
    async fn spawn_locked(
        &self,
        inner: &mut Inner,
        config: &BackendConfig,
    ) -> Result<(u64, CancellationToken), SupervisorError> {
        for issue in config.validate() {
            warn!(issue = %issue, "Backend config issue");
        }

        let plan = self.shared.deps.planner.plan(config)?;
        let log = open_log_sink(&self.shared.deps.log_path, &plan).await?;
        let child = spawn_child(&plan, log)?;
        let pid = child.id();

        let generation = inner.next_generation;
        inner.next_generation += 1;

        let stop = CancellationToken::new();
        let observer = tokio::spawn(observe_exit(
            Arc::downgrade(&self.shared),
            generation,
            child,
            stop.clone(),
        ));

        let untracked = stop.clone();
        inner.tracked = Some(Tracked {
            generation,
            pid,
            stop: stop.drop_guard(),
            observer,
        });
        inner.state = SupervisorState::Starting;

        info!(
            pid = ?pid,
            generation = %generation,
            command = %plan.command.display(),
            "Backend spawned"
        );
        Ok((generation, untracked))
    }
}

/// Open the append-mode log and write the spawn header.
async fn open_log_sink(path: &Path, plan: &LaunchPlan) -> Result<File, SupervisorError> {
    let sink_error = |source| SupervisorError::LogSink {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(sink_error)?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(sink_error)?;
    let header = format!(
        "--- backend start {} ({}) ---\n",
        chrono::Local::now().to_rfc3339(),
        plan.display_command()
    );
    file.write_all(header.as_bytes()).await.map_err(sink_error)?;
    file.flush().await.map_err(sink_error)?;

    // Stdio needs a std handle; the header is flushed so nothing is pending
    Ok(file.into_std().await)
}

fn spawn_child(plan: &LaunchPlan, log: File) -> Result<Child, SupervisorError> {
    let spawn_error = |source| SupervisorError::Spawn {
        command: plan.command.display().to_string(),
        source,
    };

    let stderr = log.try_clone().map_err(spawn_error)?;
    let mut command = Command::new(&plan.command);
    command
        .args(&plan.args)
        .env_clear()
        .envs(&plan.env)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    let child = command.spawn().map_err(spawn_error)?;
    // The child holds its own copies of the log descriptors now
    drop(command);
    Ok(child)
}

/// Wait for the child to exit or for a stop request, whichever comes first.
///
/// Runs exactly once per spawned process and always reaps it.
async fn observe_exit(
    shared: Weak<Shared>,
    generation: u64,
    mut child: Child,
    stop: CancellationToken,
) {
    let pid = child.id();
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        () = stop.cancelled() => None,
    };

    let Some(result) = exited else {
        match terminate_child(&mut child, TERM_GRACE).await {
            Ok(status) => info!(pid = ?pid, generation = %generation, status = %status, "Backend stopped"),
            Err(e) => warn!(pid = ?pid, generation = %generation, error = %e, "Failed to terminate backend"),
        }
        return;
    };

    let status = match result {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(pid = ?pid, error = %e, "Failed to wait on backend");
            None
        }
    };

    let Some(shared) = shared.upgrade() else {
        return;
    };
    report_exit(&shared, generation, pid, status.as_ref()).await;
}

async fn report_exit(
    shared: &Shared,
    generation: u64,
    pid: Option<u32>,
    status: Option<&ExitStatus>,
) {
    let code = status.and_then(ExitStatus::code);
    let signal = status.and_then(exit_signal);

    let mut inner = shared.inner.lock().await;
    if inner.tracked.as_ref().map(|t| t.generation) != Some(generation) {
        debug!(pid = ?pid, generation = %generation, "Ignoring exit of a stopped backend");
        return;
    }
    inner.tracked = None;
    inner.state = SupervisorState::Stopped;
    inner.last_exit_code = code;
    drop(inner);

    warn!(
        pid = ?pid,
        generation = %generation,
        exit_code = ?code,
        signal = ?signal,
        "Backend exited unexpectedly"
    );
    shared.deps.status.publish(StatusEvent::crashed(code, signal));
}
