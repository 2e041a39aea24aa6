//! Command implementations.

pub mod config;
pub mod generate;

use agent_config::{ConfigError, ConfigStore, PromptConfig};
use tracing::warn;

/// Loads the session configuration.
///
/// A missing file yields the defaults. A malformed file is reported and the
/// defaults are used for this session only; the file is left untouched.
///
/// # Errors
///
/// Returns the underlying error if the file exists but cannot be read.
pub async fn load_session(store: &ConfigStore) -> Result<PromptConfig, ConfigError> {
    match store.load_or_default().await {
        Ok(config) => Ok(config),
        Err(error @ ConfigError::Malformed { .. }) => {
            warn!(%error, "ignoring malformed prompt configuration, using defaults");
            Ok(PromptConfig::default())
        }
        Err(error) => Err(error),
    }
}
