//! Ambient Azure identity used to authenticate against Key Vault.
//!
//! [`DefaultAzureCredential`] tries, in order:
//!
//! 1. a service principal from `AZURE_TENANT_ID` / `AZURE_CLIENT_ID` /
//!    `AZURE_CLIENT_SECRET`;
//! 2. the managed identity endpoint of the host (App Service or IMDS);
//! 3. the signed-in Azure CLI account.
//!
//! The first source that returns a token wins.

use std::fmt;
use std::time::Duration;

use agent_config::Environment;
use async_trait::async_trait;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Request};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;
use url::{Url, form_urlencoded};

use crate::http_client::{HyperClient, build_https_client, send};
use crate::traits::{AdapterError, AdapterResult};

/// Resource identifier for Azure Key Vault tokens.
pub const KEY_VAULT_RESOURCE: &str = "https://vault.azure.net";

const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";
const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
const AUTHORITY_HOST_ENV: &str = "AZURE_AUTHORITY_HOST";
const IDENTITY_ENDPOINT_ENV: &str = "IDENTITY_ENDPOINT";
const IDENTITY_HEADER_ENV: &str = "IDENTITY_HEADER";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com/";
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

/// Bearer token issued for a resource.
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into()))
    }

    /// Exposes the token for use in an `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Source of bearer tokens for Azure resources.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Requests a token for `resource` (e.g. [`KEY_VAULT_RESOURCE`]).
    async fn access_token(&self, resource: &str) -> AdapterResult<AccessToken>;
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
}

fn decode_oauth_token(bytes: &[u8]) -> AdapterResult<AccessToken> {
    let response: OAuthTokenResponse = serde_json::from_slice(bytes)
        .map_err(|err| AdapterError::response(format!("failed to decode token response: {err}")))?;
    Ok(AccessToken::new(response.access_token))
}

/// Converts a resource identifier into an OAuth2 v2 scope.
fn scope_for(resource: &str) -> String {
    format!("{}/.default", resource.trim_end_matches('/'))
}

/// Service principal authenticated with a client secret.
pub struct ClientSecretCredential {
    client: HyperClient,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
}

impl ClientSecretCredential {
    /// Creates a credential for the supplied tenant and application.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the authority URL is invalid.
    pub fn new(
        authority_host: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> AdapterResult<Self> {
        let token_url = Url::parse(authority_host)
            .and_then(|base| base.join(&format!("{tenant_id}/oauth2/v2.0/token")))
            .map_err(|err| AdapterError::configuration(format!("invalid authority host: {err}")))?;

        Ok(Self {
            client: build_https_client()?,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        })
    }

    /// Builds the credential from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and
    /// `AZURE_CLIENT_SECRET`; returns `Ok(None)` unless all three are set.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the authority URL is invalid.
    pub fn from_env(env: &Environment) -> AdapterResult<Option<Self>> {
        let (Some(tenant), Some(client_id), Some(secret)) = (
            env.non_empty(TENANT_ID_ENV),
            env.non_empty(CLIENT_ID_ENV),
            env.non_empty(CLIENT_SECRET_ENV),
        ) else {
            return Ok(None);
        };

        let mut authority = env
            .non_empty(AUTHORITY_HOST_ENV)
            .unwrap_or(DEFAULT_AUTHORITY_HOST)
            .to_owned();
        if !authority.ends_with('/') {
            authority.push('/');
        }

        Self::new(&authority, tenant, client_id, secret).map(Some)
    }

    fn form_body(&self, resource: &str) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", self.client_secret.expose_secret())
            .append_pair("scope", &scope_for(resource))
            .finish()
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn access_token(&self, resource: &str) -> AdapterResult<AccessToken> {
        let request = Request::post(self.token_url.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(Body::from(self.form_body(resource)))
            .map_err(|err| AdapterError::transport(format!("failed to build token request: {err}")))?;

        let bytes = send(&self.client, request, Duration::from_secs(30), "Microsoft Entra ID").await?;
        decode_oauth_token(&bytes)
    }
}

/// Managed identity of the hosting environment.
pub struct ManagedIdentityCredential {
    client: HyperClient,
    app_service: Option<(String, SecretString)>,
    timeout: Duration,
}

impl ManagedIdentityCredential {
    /// Creates a credential that uses the App Service identity endpoint when
    /// `IDENTITY_ENDPOINT`/`IDENTITY_HEADER` are set and IMDS otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the HTTP client cannot be built.
    pub fn from_env(env: &Environment) -> AdapterResult<Self> {
        let app_service = env
            .non_empty(IDENTITY_ENDPOINT_ENV)
            .zip(env.non_empty(IDENTITY_HEADER_ENV))
            .map(|(endpoint, header)| (endpoint.to_owned(), SecretString::new(header.to_owned())));

        Ok(Self {
            client: build_https_client()?,
            app_service,
            timeout: Duration::from_secs(2),
        })
    }

    fn request_for(&self, resource: &str) -> AdapterResult<Request<Body>> {
        let (base, version) = match &self.app_service {
            Some((endpoint, _)) => (endpoint.as_str(), "2019-08-01"),
            None => (IMDS_ENDPOINT, "2018-02-01"),
        };
        let mut url = Url::parse(base).map_err(|err| {
            AdapterError::configuration(format!("invalid managed identity endpoint: {err}"))
        })?;
        url.query_pairs_mut()
            .append_pair("api-version", version)
            .append_pair("resource", resource);

        let mut builder = Request::get(url.as_str());
        builder = match &self.app_service {
            Some((_, header)) => builder.header("X-IDENTITY-HEADER", header.expose_secret().as_str()),
            None => builder.header("Metadata", "true"),
        };
        builder
            .body(Body::empty())
            .map_err(|err| AdapterError::transport(format!("failed to build identity request: {err}")))
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        "managed-identity"
    }

    async fn access_token(&self, resource: &str) -> AdapterResult<AccessToken> {
        let request = self.request_for(resource)?;
        let bytes = send(&self.client, request, self.timeout, "managed identity").await?;
        decode_oauth_token(&bytes)
    }
}

/// Token from the account signed in to the Azure CLI.
#[derive(Debug)]
pub struct AzureCliCredential {
    program: String,
    timeout: Duration,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };
        Self {
            program: program.to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &'static str {
        "azure-cli"
    }

    async fn access_token(&self, resource: &str) -> AdapterResult<AccessToken> {
        let output = timeout(
            self.timeout,
            Command::new(&self.program)
                .args(["account", "get-access-token", "--output", "json", "--resource"])
                .arg(resource)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| AdapterError::authentication("Azure CLI timed out"))?
        .map_err(|err| AdapterError::authentication(format!("failed to run Azure CLI: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::authentication(format!(
                "Azure CLI exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let response: CliTokenResponse = serde_json::from_slice(&output.stdout).map_err(|err| {
            AdapterError::response(format!("failed to decode Azure CLI token: {err}"))
        })?;
        Ok(AccessToken::new(response.access_token))
    }
}

/// Ordered chain of ambient token sources.
pub struct DefaultAzureCredential {
    sources: Vec<Box<dyn TokenCredential>>,
}

impl fmt::Debug for DefaultAzureCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|source| source.name()).collect();
        f.debug_struct("DefaultAzureCredential")
            .field("sources", &names)
            .finish()
    }
}

impl DefaultAzureCredential {
    /// Creates a chain from explicit sources.
    #[must_use]
    pub fn new(sources: Vec<Box<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    /// Builds the standard chain from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if a configured source is invalid.
    pub fn from_env(env: &Environment) -> AdapterResult<Self> {
        let mut sources: Vec<Box<dyn TokenCredential>> = Vec::new();
        if let Some(service_principal) = ClientSecretCredential::from_env(env)? {
            sources.push(Box::new(service_principal));
        }
        sources.push(Box::new(ManagedIdentityCredential::from_env(env)?));
        sources.push(Box::new(AzureCliCredential::default()));
        Ok(Self::new(sources))
    }
}

#[async_trait]
impl TokenCredential for DefaultAzureCredential {
    fn name(&self) -> &'static str {
        "default"
    }

    async fn access_token(&self, resource: &str) -> AdapterResult<AccessToken> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.access_token(resource).await {
                Ok(token) => {
                    debug!(source = source.name(), "acquired access token");
                    return Ok(token);
                }
                Err(err) => {
                    debug!(source = source.name(), error = %err, "token source unavailable");
                    failures.push(format!("{}: {err}", source.name()));
                }
            }
        }

        if failures.is_empty() {
            return Err(AdapterError::authentication("no token sources configured"));
        }
        Err(AdapterError::authentication(failures.join("; ")))
    }
}
