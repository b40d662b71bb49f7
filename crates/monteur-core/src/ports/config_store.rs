//! Config store trait definition.

use async_trait::async_trait;

use super::ConfigError;
use crate::config::BackendConfig;

/// Persistence for the backend configuration record.
///
/// # Contract
///
/// - `load` never loses information: stored values are merged over the
///   defaults, unknown keys survive and missing keys are backfilled
/// - `load` creates the default record on first use
/// - The supervisor only reads through this trait; it never edits a record
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the merged configuration record.
    async fn load(&self) -> Result<BackendConfig, ConfigError>;

    /// Persist a configuration record.
    async fn save(&self, config: &BackendConfig) -> Result<(), ConfigError>;
}
