//! Loading and saving the prompt configuration file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::{ConfigError, ConfigResult, PromptConfig};

/// File name used when no explicit path is supplied.
pub const DEFAULT_CONFIG_PATH: &str = "agent_task_config.json";

/// File-backed store for [`PromptConfig`].
///
/// Writes overwrite the file in place. There is no locking, so concurrent
/// writers race and the last one wins.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigStore {
    /// Creates a store for the supplied path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted configuration.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the file is not valid JSON and
    /// [`ConfigError::Io`] for any other read failure.
    pub async fn load(&self) -> ConfigResult<Option<PromptConfig>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved configuration");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let config = serde_json::from_slice(&bytes).map_err(|source| ConfigError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "loaded saved configuration");
        Ok(Some(config))
    }

    /// Loads the persisted configuration, falling back to the built-in
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`ConfigStore::load`].
    pub async fn load_or_default(&self) -> ConfigResult<PromptConfig> {
        Ok(self.load().await?.unwrap_or_default())
    }

    /// Overwrites the file with the supplied configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written.
    pub async fn save(&self, config: &PromptConfig) -> ConfigResult<()> {
        let mut bytes = serde_json::to_vec_pretty(config)?;
        bytes.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        fs::write(&self.path, bytes)
            .await
            .map_err(|source| self.io_error(source))?;
        info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
