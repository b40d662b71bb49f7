//! Backend configuration record.
//!
//! `BackendConfig` is an opaque string-to-string mapping. Every entry is
//! exposed to the backend as an environment variable, so the record keeps
//! keys it does not recognize instead of discarding them.

mod json_store;
mod validate;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use json_store::{CONFIG_FILE_NAME, JsonConfigStore};
pub use validate::ConfigIssue;

/// Recognized configuration keys and the variables injected by the launcher.
pub mod keys {
    /// Runtime mode (`dev`, `prod`, `production`).
    pub const ENV: &str = "MONTEUR_ENV";
    /// API key the backend requires from its HTTP clients.
    pub const API_KEY: &str = "MONTEUR_API_KEY";
    /// Transcription mode selector (`stub`, `local`, `api`).
    pub const TRANSCRIBE_MODE: &str = "MONTEUR_TRANSCRIBE_MODE";
    /// External transcription endpoint URL.
    pub const WHISPER_API_URL: &str = "WHISPER_API_URL";
    /// External transcription API key.
    pub const WHISPER_API_KEY: &str = "WHISPER_API_KEY";
    /// Local database file path.
    pub const SQLITE_PATH: &str = "MONTEUR_SQLITE_PATH";
    /// Media-processing binary.
    pub const FFMPEG_BIN: &str = "MONTEUR_FFMPEG_BIN";
    /// Transcription binary.
    pub const WHISPER_BIN: &str = "MONTEUR_WHISPER_BIN";

    /// Log directory injected by the launcher, never persisted.
    pub const LOG_DIR: &str = "MONTEUR_LOG_DIR";
    /// Module search path injected by the launcher, never persisted.
    pub const MODULE_PATH: &str = "PYTHONPATH";

    /// Every key present in a default record.
    pub const RECOGNIZED: [&str; 8] = [
        ENV,
        API_KEY,
        TRANSCRIBE_MODE,
        WHISPER_API_URL,
        WHISPER_API_KEY,
        SQLITE_PATH,
        FFMPEG_BIN,
        WHISPER_BIN,
    ];
}

/// Default database file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "monteur.db";

/// Configuration record passed to the backend as environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendConfig {
    entries: BTreeMap<String, String>,
}

impl BackendConfig {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default record with every recognized key.
    ///
    /// The database path lives in `data_dir` so each user profile gets its own.
    pub fn defaults(data_dir: &Path) -> Self {
        let sqlite_path = data_dir.join(DEFAULT_DATABASE_FILE);
        [
            (keys::ENV, "dev".to_string()),
            (keys::API_KEY, "change-me".to_string()),
            (keys::TRANSCRIBE_MODE, "local".to_string()),
            (keys::WHISPER_API_URL, String::new()),
            (keys::WHISPER_API_KEY, String::new()),
            (keys::SQLITE_PATH, sqlite_path.to_string_lossy().into_owned()),
            (keys::FFMPEG_BIN, "ffmpeg".to_string()),
            (keys::WHISPER_BIN, "whisper".to_string()),
        ]
        .into_iter()
        .collect()
    }

    /// Overlay `stored` on top of `defaults`.
    ///
    /// Stored values win, missing keys are backfilled and unknown stored
    /// keys are kept.
    #[must_use]
    pub fn merged_over(defaults: Self, stored: Self) -> Self {
        let mut merged = defaults;
        merged.entries.extend(stored.entries);
        merged
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Recognized keys missing from this record.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        keys::RECOGNIZED
            .into_iter()
            .filter(|key| !self.entries.contains_key(*key))
            .collect()
    }

    /// Whether `MONTEUR_ENV` selects production.
    pub fn is_production(&self) -> bool {
        self.get(keys::ENV)
            .is_some_and(|env| matches!(env.to_lowercase().as_str(), "prod" | "production"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BackendConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for BackendConfig {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
