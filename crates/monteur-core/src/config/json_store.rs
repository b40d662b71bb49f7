//! JSON file implementation of `ConfigStore`.
//!
//! One human-editable file per user profile. Hand edits that use JSON
//! numbers or booleans are accepted and stringified; nested values are
//! rejected.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::BackendConfig;
use crate::ports::{ConfigError, ConfigStore};

/// File name of the persisted config inside the data directory.
pub const CONFIG_FILE_NAME: &str = "monteur-config.json";

/// `ConfigStore` backed by a pretty-printed JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
    defaults: BackendConfig,
}

impl JsonConfigStore {
    /// Store `monteur-config.json` in `data_dir` with the standard defaults.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CONFIG_FILE_NAME),
            defaults: BackendConfig::defaults(data_dir),
        }
    }

    /// Store at an explicit path with explicit defaults.
    pub const fn with_defaults(path: PathBuf, defaults: BackendConfig) -> Self {
        Self { path, defaults }
    }

    /// Location of the config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The record used when the file is absent and for backfilling.
    pub const fn defaults(&self) -> &BackendConfig {
        &self.defaults
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parse(&self, text: &str) -> Result<BackendConfig, ConfigError> {
        let parse_error = |reason: String| ConfigError::Parse {
            path: self.path.clone(),
            reason,
        };

        let object: Map<String, Value> =
            serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;

        let mut config = BackendConfig::new();
        for (key, value) in object {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                // Treated as absent so the default is backfilled
                Value::Null => continue,
                Value::Array(_) | Value::Object(_) => {
                    return Err(parse_error(format!("value of {key} must be a scalar")));
                }
            };
            config.set(key, value);
        }
        Ok(config)
    }

    async fn write(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut json =
            serde_json::to_string_pretty(config).map_err(|source| ConfigError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        json.push('\n');

        // Write-then-rename so a crash mid-write never truncates the file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn load(&self) -> Result<BackendConfig, ConfigError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                let stored = self.parse(&text)?;
                debug!(path = %self.path.display(), keys = stored.len(), "Loaded config");
                Ok(BackendConfig::merged_over(self.defaults.clone(), stored))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Creating default config");
                self.write(&self.defaults).await?;
                Ok(self.defaults.clone())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        self.write(config).await?;
        debug!(path = %self.path.display(), keys = config.len(), "Saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys;
    use tempfile::tempdir;

    #[tokio::test]
    async fn first_load_creates_default_file() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());

        let config = store.load().await.unwrap();

        assert_eq!(&config, store.defaults());
        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains(keys::TRANSCRIBE_MODE));
    }

    #[tokio::test]
    async fn save_then_load_round_trips_every_key() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());

        let mut config = store.load().await.unwrap();
        config.set(keys::API_KEY, "k-123");
        config.set(keys::TRANSCRIBE_MODE, "api");
        config.set("MONTEUR_FEATURE_FLAG", "on");
        store.save(&config).await.unwrap();

        let reloaded = store.load().await.unwrap();
        for (key, value) in config.iter() {
            assert_eq!(reloaded.get(key), Some(value), "key {key}");
        }
    }

    #[tokio::test]
    async fn load_backfills_missing_and_keeps_unknown_keys() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());
        std::fs::write(
            store.path(),
            r#"{ "MONTEUR_API_KEY": "mine", "LEGACY_SETTING": "kept" }"#,
        )
        .unwrap();

        let config = store.load().await.unwrap();

        assert_eq!(config.get(keys::API_KEY), Some("mine"));
        assert_eq!(config.get("LEGACY_SETTING"), Some("kept"));
        assert_eq!(config.get(keys::WHISPER_BIN), Some("whisper"));
        assert!(config.missing_keys().is_empty());
    }

    #[tokio::test]
    async fn scalar_values_are_stringified() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());
        std::fs::write(store.path(), r#"{ "WORKERS": 4, "DEBUG": true, "WHISPER_API_URL": null }"#)
            .unwrap();

        let config = store.load().await.unwrap();

        assert_eq!(config.get("WORKERS"), Some("4"));
        assert_eq!(config.get("DEBUG"), Some("true"));
        assert_eq!(config.get(keys::WHISPER_API_URL), Some(""));
    }

    #[tokio::test]
    async fn nested_values_are_rejected() {
        let dir = tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path());
        std::fs::write(store.path(), r#"{ "MONTEUR_ENV": ["dev"] }"#).unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
