//! Azure `OpenAI` chat-completions adapter.

use std::{fmt, time::Duration};

use agent_config::AzureSettings;
use agent_primitives::Credential;
use async_trait::async_trait;
use futures::stream;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request, Uri};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::http_client::{HyperClient, build_https_client, send};
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    MessageRole, ModelAdapter, PromptMessage,
};

const SERVICE: &str = "Azure OpenAI";
const API_KEY_HEADER: &str = "api-key";

/// Configuration for the Azure `OpenAI` adapter.
#[derive(Clone, Debug)]
pub struct AzureOpenAiConfig {
    api_key: Option<SecretString>,
    endpoint: String,
    deployment: String,
    api_version: String,
    timeout: Duration,
}

impl AzureOpenAiConfig {
    /// Creates a configuration for the supplied resource endpoint and
    /// deployment using the default API version.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the endpoint is invalid.
    pub fn new(endpoint: impl AsRef<str>, deployment: impl Into<String>) -> AdapterResult<Self> {
        let defaults = AzureSettings::default();
        Ok(Self {
            api_key: None,
            endpoint: sanitize_endpoint(endpoint.as_ref())?,
            deployment: deployment.into(),
            api_version: defaults.api_version,
            timeout: Duration::from_secs(120),
        })
    }

    /// Builds a configuration from environment-derived settings.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the endpoint is invalid.
    pub fn from_settings(settings: &AzureSettings) -> AdapterResult<Self> {
        Ok(Self::new(&settings.endpoint, settings.deployment.clone())?
            .with_api_version(settings.api_version.clone()))
    }

    /// Overrides the REST API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Supplies the API key sent in the `api-key` header.
    #[must_use]
    pub fn with_credential(mut self, credential: &Credential) -> Self {
        self.api_key = Some(SecretString::new(credential.expose().to_owned()));
        self
    }

    /// Returns the chat-completions URL for this deployment.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the URL cannot be built.
    pub fn completions_url(&self) -> AdapterResult<String> {
        let mut url = Url::parse(&self.endpoint)
            .and_then(|base| {
                base.join(&format!(
                    "openai/deployments/{}/chat/completions",
                    self.deployment
                ))
            })
            .map_err(|err| {
                AdapterError::configuration(format!("invalid Azure OpenAI endpoint: {err}"))
            })?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url.into())
    }
}

/// Azure `OpenAI` adapter that calls a chat-completions deployment over HTTPS.
pub struct AzureOpenAiAdapter {
    client: HyperClient,
    endpoint: Uri,
    metadata: AdapterMetadata,
    api_key: SecretString,
    timeout: Duration,
}

impl fmt::Debug for AzureOpenAiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiAdapter")
            .field("deployment", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AzureOpenAiAdapter {
    /// Constructs a new adapter with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the API key is missing or
    /// the endpoint is invalid.
    pub fn new(config: AzureOpenAiConfig) -> AdapterResult<Self> {
        let endpoint = config.completions_url()?.parse::<Uri>().map_err(|err| {
            AdapterError::configuration(format!("invalid Azure OpenAI endpoint: {err}"))
        })?;
        let api_key = config
            .api_key
            .ok_or_else(|| AdapterError::configuration("Azure OpenAI adapter requires an API key"))?;

        Ok(Self {
            client: build_https_client()?,
            endpoint,
            metadata: AdapterMetadata::new("azure-openai", config.deployment),
            api_key,
            timeout: config.timeout,
        })
    }

    fn build_request(&self, request: &InferenceRequest) -> ChatCompletionRequest {
        let system = request
            .system_prompt()
            .map(|prompt| PromptMessage::new(MessageRole::System, prompt));
        let messages = system
            .iter()
            .chain(request.messages())
            .map(map_prompt_message)
            .collect();

        ChatCompletionRequest {
            messages,
            temperature: request.temperature(),
            max_tokens: request.max_output_tokens(),
        }
    }
}

#[async_trait]
impl ModelAdapter for AzureOpenAiAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        let payload = self.build_request(&request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode Azure OpenAI request: {err}"))
        })?;

        let request = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.api_key.expose_secret().as_str())
            .body(Body::from(body))
            .map_err(|err| {
                AdapterError::transport(format!("failed to build Azure OpenAI request: {err}"))
            })?;

        debug!(
            deployment = self.metadata.model(),
            messages = payload.messages.len(),
            "sending chat completion"
        );
        let bytes = send(&self.client, request, self.timeout, SERVICE).await?;
        let content = parse_completion(&bytes)?;

        let stream = stream::once(async move { Ok(InferenceChunk::new(content, true)) });
        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn map_prompt_message(message: &PromptMessage) -> ChatMessage {
    ChatMessage {
        role: message.role().to_string(),
        content: message.content().to_owned(),
    }
}

fn parse_completion(bytes: &[u8]) -> AdapterResult<String> {
    let response: ChatCompletionResponse = serde_json::from_slice(bytes).map_err(|err| {
        AdapterError::response(format!("failed to decode Azure OpenAI response: {err}"))
    })?;

    Ok(response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.and_then(|message| message.content))
        .unwrap_or_default())
}

fn sanitize_endpoint(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "Azure OpenAI endpoint must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|err| {
        AdapterError::configuration(format!("invalid Azure OpenAI endpoint: {err}"))
    })?;
    Ok(base)
}
