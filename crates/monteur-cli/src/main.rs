//! CLI entry point - the composition root.
//!
//! Logging goes to stderr so stdout stays machine-readable for the
//! status lines printed by `run`.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use monteur_cli::error::exit_code_for;
use monteur_cli::{Cli, CliConfig, Commands, bootstrap, handlers};
use monteur_runtime::DeploymentMode;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            packaged,
            development,
            timeout_ms,
        } => {
            let mut config = CliConfig::with_defaults();
            if packaged {
                config.mode = DeploymentMode::Packaged;
            } else if development {
                config.mode = DeploymentMode::Development;
            }
            config.ready_timeout = Duration::from_millis(timeout_ms);

            let ctx = bootstrap(&config)?;
            handlers::run::execute(ctx).await
        }
        Commands::Config { command } => handlers::config::execute(command).await,
        Commands::Paths => handlers::paths::execute(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before any path or mode is resolved
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = u8::try_from(exit_code_for(&e)).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
