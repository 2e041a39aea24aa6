//! Endpoint settings and generation parameters.

use std::fmt;
use std::str::FromStr;

use crate::{ConfigError, ConfigResult, Environment};

/// Variable holding the model API key.
pub const API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
/// Variable overriding the Azure `OpenAI` resource endpoint.
pub const ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
/// Variable overriding the deployment name.
pub const DEPLOYMENT_ENV: &str = "AZURE_OPENAI_DEPLOYMENT";
/// Variable overriding the REST API version.
pub const API_VERSION_ENV: &str = "AZURE_OPENAI_API_VERSION";
/// Variable naming the Key Vault instance that holds the API key.
pub const KEY_VAULT_ENV: &str = "AZURE_KEY_VAULT_NAME";

/// Endpoint used when [`ENDPOINT_ENV`] is unset.
pub const DEFAULT_ENDPOINT: &str = "https://rstapestryopenai2.openai.azure.com/";
/// Deployment used when [`DEPLOYMENT_ENV`] is unset.
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4";
/// API version used when [`API_VERSION_ENV`] is unset.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Azure `OpenAI` endpoint settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AzureSettings {
    /// Resource endpoint, e.g. `https://example.openai.azure.com/`.
    pub endpoint: String,
    /// Deployment (model) name.
    pub deployment: String,
    /// REST API version query parameter.
    pub api_version: String,
    /// Key Vault instance holding the API key, if configured.
    pub key_vault_name: Option<String>,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            deployment: DEFAULT_DEPLOYMENT.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            key_vault_name: None,
        }
    }
}

impl AzureSettings {
    /// Reads settings from the environment, applying defaults for unset or
    /// blank variables.
    #[must_use]
    pub fn from_env(env: &Environment) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, fallback: String| {
            env.non_empty(key).map_or(fallback, str::to_owned)
        };

        Self {
            endpoint: pick(ENDPOINT_ENV, defaults.endpoint),
            deployment: pick(DEPLOYMENT_ENV, defaults.deployment),
            api_version: pick(API_VERSION_ENV, defaults.api_version),
            key_vault_name: env.non_empty(KEY_VAULT_ENV).map(str::to_owned),
        }
    }
}

/// Sampling temperature shared by every agent, constrained to `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Temperature(f32);

impl Temperature {
    /// Default temperature.
    pub const DEFAULT: Self = Self(0.7);

    /// Validates and wraps a temperature.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] if the value is not a finite
    /// number within `0.0..=1.0`.
    pub fn new(value: f32) -> ConfigResult<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidSetting {
                name: "temperature",
                reason: format!("{value} is outside 0.0..=1.0"),
            })
        }
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Temperature {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f32>().map_err(|err| ConfigError::InvalidSetting {
            name: "temperature",
            reason: format!("`{s}` is not a number: {err}"),
        })?;
        Self::new(value)
    }
}
