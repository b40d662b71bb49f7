//! Subcommand definitions.

use clap::Subcommand;

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Boot the backend and supervise it until quit
    ///
    /// Status events are printed to stdout as JSON lines. Operator commands
    /// are read from stdin: status, restart, set KEY=VALUE, show, quit.
    Run {
        /// Launch the bundled backend executable
        #[arg(long, conflicts_with = "development")]
        packaged: bool,
        /// Launch the backend from source through the interpreter
        #[arg(long)]
        development: bool,
        /// Readiness deadline in milliseconds
        #[arg(long, default_value_t = 40_000)]
        timeout_ms: u64,
    },
    /// Inspect or edit the persisted backend config
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Show resolved data, resource and log paths
    Paths,
}

/// Config store commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the merged config as JSON
    Show,
    /// Persist one or more KEY=VALUE entries
    Set {
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
    /// Report config issues the backend would reject
    Check,
}

/// Parse `KEY=VALUE`. The value may itself contain `=`.
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{input}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
