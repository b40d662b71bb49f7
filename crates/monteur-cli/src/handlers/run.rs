//! Run command handler.
//!
//! Boots the backend, prints every status event as one JSON line on stdout
//! and reads operator commands from stdin until `quit` or Ctrl-C. A boot
//! that cannot launch the backend ends the command with its exit code.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use monteur_core::{ConfigStore, StatusEvent};
use monteur_runtime::{StartOutcome, SupervisorError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::bootstrap::CliContext;
use crate::commands::parse_assignment;
use crate::error::CliError;
use crate::handlers::config::apply_assignments;

/// How long to wait for an in-flight boot after shutdown.
const BOOT_SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands accepted on stdin while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Print the supervisor snapshot
    Status,
    /// Stop and start the backend with the stored config
    Restart,
    /// Persist one key and restart with it
    Set(String, String),
    /// Print the stored config
    Show,
    Quit,
}

impl FromStr for OperatorCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match (verb, rest.trim()) {
            ("status", "") => Ok(Self::Status),
            ("restart", "") => Ok(Self::Restart),
            ("show", "") => Ok(Self::Show),
            ("quit" | "exit", "") => Ok(Self::Quit),
            ("set", assignment) => {
                let (key, value) = parse_assignment(assignment)?;
                Ok(Self::Set(key, value))
            }
            _ => Err(format!(
                "unknown command '{line}' (expected status, restart, set KEY=VALUE, show, quit)"
            )),
        }
    }
}

/// Run the supervisor until the operator quits.
pub async fn execute(ctx: CliContext) -> Result<()> {
    let printer = spawn_status_printer(ctx.broadcaster.subscribe());

    let mut boot = {
        let supervisor = ctx.supervisor.clone();
        tokio::spawn(async move { supervisor.boot().await })
    };
    let mut booting = true;
    let mut outcome = Ok(());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            joined = &mut boot, if booting => {
                booting = false;
                if let Err(e) = boot_result(joined) {
                    outcome = Err(e);
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<OperatorCommand>() {
                    Ok(OperatorCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = handle(&ctx, command).await {
                            eprintln!("{e:#}");
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                },
                // Keep supervising without a console until Ctrl-C
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    stdin_open = false;
                }
            },
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Interrupted");
                break;
            }
        }
    }

    info!("Shutting down backend");
    ctx.supervisor.shutdown().await;
    if booting && tokio::time::timeout(BOOT_SETTLE_TIMEOUT, boot).await.is_err() {
        warn!("Boot did not settle after shutdown");
    }
    printer.abort();
    outcome
}

/// Turn the finished boot task into the command's result.
///
/// Readiness timeouts keep the backend running and are not errors here.
fn boot_result(joined: Result<Result<StartOutcome, SupervisorError>, JoinError>) -> Result<()> {
    match joined {
        Ok(Ok(outcome)) => {
            info!(outcome = ?outcome, "Boot finished");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Backend boot failed");
            Err(CliError::from(e).into())
        }
        Err(e) => Err(CliError::Process(format!("boot task failed: {e}")).into()),
    }
}

async fn handle(ctx: &CliContext, command: OperatorCommand) -> Result<()> {
    match command {
        OperatorCommand::Status => {
            let snapshot = ctx.supervisor.snapshot().await;
            println!("{}", serde_json::to_string(&snapshot)?);
        }
        OperatorCommand::Show => {
            let config = ctx.store.load().await?;
            println!("{}", serde_json::to_string(&config)?);
        }
        OperatorCommand::Restart => {
            let supervisor = ctx.supervisor.clone();
            tokio::spawn(async move {
                if let Err(e) = supervisor.restart().await {
                    error!(error = %e, "Backend restart failed");
                }
            });
        }
        OperatorCommand::Set(key, value) => {
            let mut config = ctx.store.load().await?;
            apply_assignments(&mut config, [(key, value)]);
            let supervisor = ctx.supervisor.clone();
            tokio::spawn(async move {
                if let Err(e) = supervisor.apply_config(config).await {
                    error!(error = %e, "Applying config failed");
                }
            });
        }
        OperatorCommand::Quit => {}
    }
    Ok(())
}

fn spawn_status_printer(mut rx: broadcast::Receiver<StatusEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event.to_wire()) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "Failed to encode status event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = %skipped, "Status printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
