//! Headless shell for the Monteur backend supervisor.
//!
//! Stands in for the desktop shell: it wires the supervisor, prints status
//! events as JSON lines and exposes the config store on the command line.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, ConfigCommand};
pub use error::CliError;
pub use parser::Cli;
