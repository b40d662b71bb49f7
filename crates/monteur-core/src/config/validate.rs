//! Preflight checks mirroring the rules the backend enforces at startup.
//!
//! Issues are advisory: the supervisor logs them before launching so a
//! backend that refuses to boot leaves a readable reason in the shell log.

use thiserror::Error;

use super::{BackendConfig, keys};

/// Accepted values for `MONTEUR_TRANSCRIBE_MODE`.
pub const TRANSCRIBE_MODES: [&str; 3] = ["stub", "local", "api"];

/// A configuration problem the backend would reject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{key} must be one of: stub, local, api (got {value:?})", key = keys::TRANSCRIBE_MODE)]
    UnknownTranscribeMode { value: String },

    #[error("stub transcription mode is forbidden in production")]
    StubInProduction,

    #[error("{0} is required when {mode}=api", mode = keys::TRANSCRIBE_MODE)]
    MissingApiSetting(&'static str),

    #[error("{key} is required in production", key = keys::API_KEY)]
    MissingApiKey,
}

impl BackendConfig {
    /// Check the record against the backend's startup rules.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mode = self.get(keys::TRANSCRIBE_MODE).unwrap_or_default();

        if !TRANSCRIBE_MODES.contains(&mode) {
            issues.push(ConfigIssue::UnknownTranscribeMode {
                value: mode.to_string(),
            });
        }

        if self.is_production() && mode == "stub" {
            issues.push(ConfigIssue::StubInProduction);
        }

        if mode == "api" {
            for key in [keys::WHISPER_API_URL, keys::WHISPER_API_KEY] {
                if self.get(key).is_none_or(str::is_empty) {
                    issues.push(ConfigIssue::MissingApiSetting(key));
                }
            }
        }

        if self.is_production() && self.get(keys::API_KEY).is_none_or(str::is_empty) {
            issues.push(ConfigIssue::MissingApiKey);
        }

        issues
    }
}
