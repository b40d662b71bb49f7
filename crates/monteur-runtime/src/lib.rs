//! Backend process runtime for the Monteur desktop shell.
//!
//! Owns everything that touches the operating system on behalf of the
//! supervisor: resolving how to launch the backend, spawning and reaping
//! it, polling its liveness endpoint and fanning status out to listeners.
#![deny(unsafe_code)]

mod broadcaster;
pub mod launch;
pub mod probe;
mod shutdown;
pub mod supervisor;

pub use broadcaster::StatusBroadcaster;
pub use launch::{
    BACKEND_PORT, DeploymentMode, FilesystemProbe, LaunchError, LaunchPlan, LaunchPlanner,
    LaunchResolver, LaunchSettings, Platform, RealFilesystem,
};
pub use probe::{HealthCheck, HttpHealthCheck, ReadinessProbe};
pub use shutdown::{TERM_GRACE, exit_signal, terminate_child};
pub use supervisor::{
    BackendSupervisor, StartOutcome, SupervisorDeps, SupervisorError, SupervisorSnapshot,
    SupervisorState,
};
