//! Core domain types and port definitions for the Monteur desktop shell.
//!
//! This crate has no process or network code. It defines:
//! - `BackendConfig` - the environment record handed to the backend
//! - `StatusEvent` - supervisor outcomes delivered to UI listeners
//! - Ports (`ConfigStore`, `StatusEmitter`) implemented by adapters
//! - Path resolution for the per-user data directory and bundled resources
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod events;
pub mod paths;
pub mod ports;

pub use config::{BackendConfig, ConfigIssue, JsonConfigStore, keys};
pub use events::{BackendStatus, StatusEvent, StatusPhase};
pub use paths::{PathError, ResolvedPaths};
pub use ports::{ConfigError, ConfigStore, StatusEmitter};
