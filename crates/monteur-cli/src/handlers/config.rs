//! Config command handlers.
//!
//! Operate on the persisted record directly; no supervisor is involved.

use anyhow::Result;
use monteur_core::{BackendConfig, ConfigStore, JsonConfigStore, ResolvedPaths};

use crate::bootstrap::config_store;
use crate::commands::ConfigCommand;
use crate::error::CliError;

/// Dispatch a `config` subcommand against the resolved data directory.
pub async fn execute(command: ConfigCommand) -> Result<()> {
    let paths = ResolvedPaths::resolve().map_err(CliError::from)?;
    let store = config_store(&paths);

    match command {
        ConfigCommand::Show => show(&store).await,
        ConfigCommand::Set { assignments } => {
            let count = assignments.len();
            set(&store, assignments).await?;
            println!("Saved {count} key(s) to {}", store.path().display());
            Ok(())
        }
        ConfigCommand::Check => check(&store).await,
    }
}

/// Print the merged config as pretty JSON.
pub async fn show(store: &dyn ConfigStore) -> Result<()> {
    let config = store.load().await.map_err(CliError::from)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Overlay `assignments` on the stored config and persist it.
pub async fn set(
    store: &JsonConfigStore,
    assignments: Vec<(String, String)>,
) -> Result<BackendConfig> {
    let mut config = store.load().await.map_err(CliError::from)?;
    apply_assignments(&mut config, assignments);
    store.save(&config).await.map_err(CliError::from)?;
    Ok(config)
}

/// Print validation issues; fails when there are any.
pub async fn check(store: &dyn ConfigStore) -> Result<()> {
    let config = store.load().await.map_err(CliError::from)?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("Config OK");
        return Ok(());
    }

    for issue in &issues {
        println!("- {issue}");
    }
    Err(CliError::Config(format!("{} issue(s) found", issues.len())).into())
}

pub fn apply_assignments(
    config: &mut BackendConfig,
    assignments: impl IntoIterator<Item = (String, String)>,
) {
    for (key, value) in assignments {
        config.set(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monteur_core::keys;
    use tempfile::tempdir;

    #[tokio::test]
    async fn set_persists_and_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());

        set(
            &store,
            vec![(keys::TRANSCRIBE_MODE.to_string(), "stub".to_string())],
        )
        .await
        .unwrap();

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.get(keys::TRANSCRIBE_MODE), Some("stub"));
        assert_eq!(reloaded.get(keys::FFMPEG_BIN), Some("ffmpeg"));
    }

    #[tokio::test]
    async fn check_fails_on_invalid_config() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());
        set(
            &store,
            vec![(keys::TRANSCRIBE_MODE.to_string(), "cloud".to_string())],
        )
        .await
        .unwrap();

        let err = check(&store).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Config(_))
        ));
    }

    #[tokio::test]
    async fn defaults_pass_check() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());
        check(&store).await.unwrap();
    }
}
