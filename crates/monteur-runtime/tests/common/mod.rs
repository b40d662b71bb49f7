//! Shared harness for supervisor integration tests.
//!
//! Backends are real `sh` children so spawn, exit and signal handling go
//! through the OS. Readiness is scripted instead of probed over HTTP.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use monteur_core::{BackendConfig, ConfigError, ConfigStore, StatusEvent, StatusPhase};
use monteur_runtime::{
    BackendSupervisor, HealthCheck, LaunchError, LaunchPlan, LaunchPlanner, ReadinessProbe,
    StatusBroadcaster, SupervisorDeps,
};
use tempfile::TempDir;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Ordered record of collaborator calls.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

// ── Collaborators ──────────────────────────────────────────────────

/// Plans `sh -c <script>` with the test's environment plus the config.
pub struct ShellPlanner {
    command: PathBuf,
    script: String,
    journal: Journal,
}

impl LaunchPlanner for ShellPlanner {
    fn plan(&self, config: &BackendConfig) -> Result<LaunchPlan, LaunchError> {
        self.journal.lock().unwrap().push("plan".to_string());
        let mut env: BTreeMap<OsString, OsString> = std::env::vars_os().collect();
        env.extend(config.iter().map(|(k, v)| (OsString::from(k), OsString::from(v))));
        Ok(LaunchPlan {
            command: self.command.clone(),
            args: vec!["-c".to_string(), self.script.clone()],
            env,
        })
    }
}

/// In-memory store; saves are journaled with the value of `MARK`.
pub struct MemoryStore {
    config: Mutex<BackendConfig>,
    journal: Journal,
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load(&self) -> Result<BackendConfig, ConfigError> {
        self.journal.lock().unwrap().push("load".to_string());
        Ok(self.config.lock().unwrap().clone())
    }

    async fn save(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        let mark = config.get("MARK").unwrap_or_default().to_string();
        self.journal.lock().unwrap().push(format!("save:{mark}"));
        *self.config.lock().unwrap() = config.clone();
        Ok(())
    }
}

/// Always answers the same.
pub struct StaticHealth(pub bool);

#[async_trait]
impl HealthCheck for StaticHealth {
    async fn check(&self) -> bool {
        self.0
    }
}

// ── Harness ────────────────────────────────────────────────────────

pub struct Harness {
    pub supervisor: BackendSupervisor,
    pub broadcaster: StatusBroadcaster,
    pub journal: Journal,
    pub dir: TempDir,
    log_file: String,
}

impl Harness {
    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join(&self.log_file)
    }
}

pub struct HarnessBuilder {
    command: PathBuf,
    script: String,
    healthy: bool,
    ready_timeout: Duration,
    store: Option<Arc<dyn ConfigStore>>,
    log_file: String,
}

impl HarnessBuilder {
    pub fn new(script: &str) -> Self {
        Self {
            command: PathBuf::from("sh"),
            script: script.to_string(),
            healthy: true,
            ready_timeout: Duration::from_secs(2),
            store: None,
            log_file: "backend.log".to_string(),
        }
    }

    pub fn command(mut self, command: &str) -> Self {
        self.command = PathBuf::from(command);
        self
    }

    pub fn never_ready(mut self, timeout: Duration) -> Self {
        self.healthy = false;
        self.ready_timeout = timeout;
        self
    }

    pub fn store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Log location relative to the harness directory.
    pub fn log_file(mut self, relative: &str) -> Self {
        self.log_file = relative.to_string();
        self
    }

    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let broadcaster = StatusBroadcaster::new();

        let store = self.store.unwrap_or_else(|| {
            Arc::new(MemoryStore {
                config: Mutex::new(BackendConfig::defaults(dir.path())),
                journal: journal.clone(),
            })
        });
        let planner = Arc::new(ShellPlanner {
            command: self.command,
            script: self.script,
            journal: journal.clone(),
        });
        let readiness = ReadinessProbe::new(Arc::new(StaticHealth(self.healthy)))
            .with_interval(Duration::from_millis(20));

        let supervisor = BackendSupervisor::new(SupervisorDeps {
            config_store: store,
            planner,
            readiness,
            status: Arc::new(broadcaster.clone()),
            log_path: dir.path().join(&self.log_file),
            ready_timeout: self.ready_timeout,
        });

        Harness {
            supervisor,
            broadcaster,
            journal,
            dir,
            log_file: self.log_file,
        }
    }
}

// ── Event helpers ──────────────────────────────────────────────────

/// Receive events until one with `phase` arrives.
pub async fn wait_for(rx: &mut broadcast::Receiver<StatusEvent>, phase: StatusPhase) -> StatusEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = rx.recv().await.unwrap();
            if event.phase == phase {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no {phase} event within 10s"))
}

/// Everything currently queued.
pub fn drain(rx: &mut broadcast::Receiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return events,
            Err(TryRecvError::Lagged(n)) => panic!("lagged by {n} events"),
        }
    }
}

pub fn count(events: &[StatusEvent], phase: StatusPhase) -> usize {
    events.iter().filter(|e| e.phase == phase).count()
}
