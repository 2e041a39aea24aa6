//! Credential resolution chain.
//!
//! A [`CredentialChain`] holds an ordered list of [`CredentialSource`]
//! strategies and stops at the first one that produces a credential. Sources
//! that fail are logged and recorded in the [`Resolution`]; a failure never
//! aborts the chain.

use std::fmt;
use std::sync::Arc;

use agent_primitives::Credential;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::Environment;
use crate::settings::{API_KEY_ENV, AzureSettings};

/// Name of the Key Vault secret holding the API key.
pub const KEY_VAULT_SECRET_NAME: &str = "AZURE-OPENAI-API-KEY";

/// Errors raised by individual credential sources.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The remote secret store could not produce the secret.
    #[error("secret store `{store}` failed: {reason}")]
    SecretStore {
        /// Store identifier (e.g. the vault name).
        store: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Reading interactive input failed.
    #[error("failed to read credential from terminal: {source}")]
    Input {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl CredentialError {
    /// Convenience constructor for secret-store failures.
    #[must_use]
    pub fn secret_store(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SecretStore {
            store: store.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// A strategy that attempts to produce a credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Attempts to produce a credential. `Ok(None)` means the source is not
    /// configured or had nothing to offer.
    async fn resolve(&self) -> CredentialResult<Option<Credential>>;
}

/// Remote secret store capable of fetching a named secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches `secret` from the store instance `vault`.
    async fn fetch_secret(&self, vault: &str, secret: &str) -> CredentialResult<String>;
}

/// Line-oriented user input used by [`InteractiveCredential`].
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Shows `message` and returns the line the user typed.
    async fn prompt_secret(&self, message: &str) -> std::io::Result<String>;
}

/// Reads the credential from an environment variable.
pub struct EnvCredential {
    var: String,
    value: Option<String>,
}

impl EnvCredential {
    /// Captures `var` from the supplied environment.
    #[must_use]
    pub fn new(env: &Environment, var: impl Into<String>) -> Self {
        let var = var.into();
        let value = env.get(&var).map(str::to_owned);
        Self { var, value }
    }

    /// Reads the default API key variable.
    #[must_use]
    pub fn api_key(env: &Environment) -> Self {
        Self::new(env, API_KEY_ENV)
    }
}

impl fmt::Debug for EnvCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredential")
            .field("var", &self.var)
            .field("present", &self.value.is_some())
            .finish()
    }
}

#[async_trait]
impl CredentialSource for EnvCredential {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn resolve(&self) -> CredentialResult<Option<Credential>> {
        let credential = self.value.as_deref().and_then(Credential::non_empty);
        if credential.is_none() {
            debug!(var = %self.var, "credential variable not set");
        }
        Ok(credential)
    }
}

/// Fetches the credential from a remote secret store when a vault is named.
pub struct SecretStoreCredential {
    vault: Option<String>,
    secret: String,
    store: Arc<dyn SecretStore>,
}

impl SecretStoreCredential {
    /// Creates a source reading `secret` from `vault` (if any) through `store`.
    #[must_use]
    pub fn new(vault: Option<String>, secret: impl Into<String>, store: Arc<dyn SecretStore>) -> Self {
        Self {
            vault,
            secret: secret.into(),
            store,
        }
    }

    /// Fetches [`KEY_VAULT_SECRET_NAME`] from the vault named in `settings`.
    #[must_use]
    pub fn from_settings(settings: &AzureSettings, store: Arc<dyn SecretStore>) -> Self {
        Self::new(settings.key_vault_name.clone(), KEY_VAULT_SECRET_NAME, store)
    }
}

#[async_trait]
impl CredentialSource for SecretStoreCredential {
    fn name(&self) -> &'static str {
        "secret-store"
    }

    async fn resolve(&self) -> CredentialResult<Option<Credential>> {
        let Some(vault) = self.vault.as_deref() else {
            debug!("no secret store configured");
            return Ok(None);
        };

        debug!(vault, secret = %self.secret, "fetching credential from secret store");
        let value = self.store.fetch_secret(vault, &self.secret).await?;
        Ok(Credential::non_empty(value))
    }
}

/// Asks the user to type the credential.
pub struct InteractiveCredential<P> {
    prompter: P,
    message: String,
}

impl<P: Prompter> InteractiveCredential<P> {
    /// Creates a source that prompts with the default message.
    #[must_use]
    pub fn new(prompter: P) -> Self {
        Self {
            prompter,
            message: "Enter your Azure OpenAI API Key: ".to_owned(),
        }
    }
}

#[async_trait]
impl<P: Prompter> CredentialSource for InteractiveCredential<P> {
    fn name(&self) -> &'static str {
        "interactive"
    }

    async fn resolve(&self) -> CredentialResult<Option<Credential>> {
        let line = self.prompter.prompt_secret(&self.message).await?;
        Ok(Credential::non_empty(line.trim()))
    }
}

/// A source that failed during resolution.
#[derive(Debug)]
pub struct SourceFailure {
    /// Name of the failing source.
    pub source: &'static str,
    /// What went wrong.
    pub error: CredentialError,
}

/// Outcome of running a [`CredentialChain`].
#[derive(Debug, Default)]
pub struct Resolution {
    credential: Option<Credential>,
    source: Option<&'static str>,
    failures: Vec<SourceFailure>,
}

impl Resolution {
    /// The resolved credential, if any source produced one.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Consumes the resolution, returning the credential.
    #[must_use]
    pub fn into_credential(self) -> Option<Credential> {
        self.credential
    }

    /// Name of the source that produced the credential.
    #[must_use]
    pub fn source(&self) -> Option<&'static str> {
        self.source
    }

    /// Non-fatal failures encountered along the way.
    #[must_use]
    pub fn failures(&self) -> &[SourceFailure] {
        &self.failures
    }

    /// Returns `true` if a credential was resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.credential.is_some()
    }
}

/// Ordered list of credential sources.
#[derive(Default)]
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl fmt::Debug for CredentialChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|source| source.name()).collect();
        f.debug_struct("CredentialChain")
            .field("sources", &names)
            .finish()
    }
}

impl CredentialChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain of the automated sources: API key variable, then secret store.
    #[must_use]
    pub fn automated(env: &Environment, store: Arc<dyn SecretStore>) -> Self {
        Self::new()
            .with_source(EnvCredential::api_key(env))
            .with_source(SecretStoreCredential::from_settings(&AzureSettings::from_env(env), store))
    }

    /// Appends a source to the end of the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl CredentialSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Runs the sources in order until one yields a credential.
    pub async fn resolve(&self) -> Resolution {
        let mut resolution = Resolution::default();

        for source in &self.sources {
            match source.resolve().await {
                Ok(Some(credential)) => {
                    info!(source = source.name(), "credential resolved");
                    resolution.credential = Some(credential);
                    resolution.source = Some(source.name());
                    break;
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(source = source.name(), %error, "credential source failed");
                    resolution.failures.push(SourceFailure {
                        source: source.name(),
                        error,
                    });
                }
            }
        }

        if !resolution.is_resolved() {
            debug!("no credential source produced a value");
        }
        resolution
    }
}

/// Resolves the credential through the automated chain: the API key
/// variable first, then the secret store named by
/// [`KEY_VAULT_ENV`](crate::settings::KEY_VAULT_ENV).
pub async fn resolve_credential(env: &Environment, store: Arc<dyn SecretStore>) -> Resolution {
    CredentialChain::automated(env, store).resolve().await
}
