//! Error types for configuration handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while loading, saving, or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the configuration file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file exists but is not valid JSON for the schema.
    #[error("malformed configuration in {}: {source}", path.display())]
    Malformed {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser error.
        source: serde_json::Error,
    },

    /// The configuration could not be encoded.
    #[error("failed to encode configuration: {source}")]
    Encode {
        /// Encoder error.
        #[from]
        source: serde_json::Error,
    },

    /// A dotted key path did not name a known configuration field.
    #[error("unknown configuration key `{key}`")]
    UnknownKey {
        /// The offending key.
        key: String,
    },

    /// A setting value was outside its accepted range or format.
    #[error("invalid {name}: {reason}")]
    InvalidSetting {
        /// Name of the setting.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
