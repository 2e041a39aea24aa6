//! Azure Key Vault secret client.

use std::sync::Arc;
use std::time::Duration;

use agent_config::{CredentialError, CredentialResult, Environment, SecretStore};
use async_trait::async_trait;
use hyper::header::{ACCEPT, AUTHORIZATION};
use hyper::{Body, Request};
use serde::Deserialize;
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, send};
use crate::identity::{DefaultAzureCredential, KEY_VAULT_RESOURCE, TokenCredential};
use crate::traits::{AdapterError, AdapterResult};

const API_VERSION: &str = "7.4";

#[derive(Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

/// Reads secrets from Azure Key Vault over its REST API.
pub struct KeyVaultClient {
    client: HyperClient,
    credential: Arc<dyn TokenCredential>,
    timeout: Duration,
}

impl KeyVaultClient {
    /// Creates a client that authenticates with `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the HTTP client cannot be built.
    pub fn new(credential: Arc<dyn TokenCredential>) -> AdapterResult<Self> {
        Ok(Self {
            client: build_https_client()?,
            credential,
            timeout: Duration::from_secs(30),
        })
    }

    /// Fetches the current version of `secret` from `vault`.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`] if the vault name is invalid, no token can
    /// be acquired, or the vault rejects the request.
    pub async fn get_secret(&self, vault: &str, secret: &str) -> AdapterResult<String> {
        let url = secret_url(vault, secret)?;
        let token = self.credential.access_token(KEY_VAULT_RESOURCE).await?;

        let request = Request::get(url.as_str())
            .header(AUTHORIZATION, format!("Bearer {}", token.secret()))
            .header(ACCEPT, "application/json")
            .body(Body::empty())
            .map_err(|err| AdapterError::transport(format!("failed to build Key Vault request: {err}")))?;

        debug!(vault, secret, "requesting Key Vault secret");
        let bytes = send(&self.client, request, self.timeout, "Key Vault").await?;
        let bundle: SecretBundle = serde_json::from_slice(&bytes)
            .map_err(|err| AdapterError::response(format!("failed to decode Key Vault secret: {err}")))?;

        bundle
            .value
            .ok_or_else(|| AdapterError::response(format!("secret `{secret}` has no value")))
    }
}

#[async_trait]
impl SecretStore for KeyVaultClient {
    async fn fetch_secret(&self, vault: &str, secret: &str) -> CredentialResult<String> {
        self.get_secret(vault, secret)
            .await
            .map_err(|err| CredentialError::secret_store(vault, err.to_string()))
    }
}

/// Secret store used when the Key Vault client could not be configured.
///
/// Every fetch fails with the configuration error, so the credential chain
/// records it as a source failure and moves on.
#[derive(Debug)]
pub struct UnavailableSecretStore {
    reason: String,
}

impl UnavailableSecretStore {
    /// Creates a store that always fails with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SecretStore for UnavailableSecretStore {
    async fn fetch_secret(&self, vault: &str, _secret: &str) -> CredentialResult<String> {
        Err(CredentialError::secret_store(vault, self.reason.clone()))
    }
}

/// Builds a Key Vault secret store authenticated with
/// [`DefaultAzureCredential`].
///
/// Identity configuration errors surface on the first fetch, which only
/// happens when a vault is named and the API key variable is unset.
#[must_use]
pub fn key_vault_store(env: &Environment) -> Arc<dyn SecretStore> {
    let client = DefaultAzureCredential::from_env(env)
        .and_then(|identity| KeyVaultClient::new(Arc::new(identity)));

    match client {
        Ok(client) => Arc::new(client),
        Err(err) => {
            debug!(error = %err, "Key Vault client unavailable");
            Arc::new(UnavailableSecretStore::new(format!(
                "failed to configure Key Vault client: {err}"
            )))
        }
    }
}

/// Vault names are 3-24 characters of ASCII letters, digits, and hyphens,
/// starting with a letter.
fn validate_vault_name(vault: &str) -> AdapterResult<()> {
    let valid_len = (3..=24).contains(&vault.len());
    let valid_chars = vault
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
    let starts_with_letter = vault.chars().next().is_some_and(|ch| ch.is_ascii_alphabetic());

    if valid_len && valid_chars && starts_with_letter {
        Ok(())
    } else {
        Err(AdapterError::configuration(format!(
            "invalid Key Vault name `{vault}`"
        )))
    }
}

fn validate_secret_name(secret: &str) -> AdapterResult<()> {
    if !secret.is_empty() && secret.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
        Ok(())
    } else {
        Err(AdapterError::configuration(format!(
            "invalid Key Vault secret name `{secret}`"
        )))
    }
}

fn secret_url(vault: &str, secret: &str) -> AdapterResult<String> {
    validate_vault_name(vault)?;
    validate_secret_name(secret)?;
    Ok(format!(
        "https://{vault}.vault.azure.net/secrets/{secret}?api-version={API_VERSION}"
    ))
}
