//! The generate action: validation, connectivity probe, crew construction,
//! and execution, each stage short-circuiting the rest.

use std::fmt;
use std::sync::Arc;

use agent_adapters::azure_openai::{AzureOpenAiAdapter, AzureOpenAiConfig};
use agent_adapters::traits::{AdapterResult, ModelAdapter};
use agent_config::{AzureSettings, PromptConfig, Temperature};
use agent_primitives::Credential;
use tracing::{info, instrument};

use crate::crew::{Crew, CrewOutput};
use crate::error::{PipelineError, PipelineResult};
use crate::probe::probe;

/// Builds a model adapter once a credential is known.
pub trait AdapterFactory: Send + Sync {
    /// Creates an adapter authorised by `credential`.
    ///
    /// # Errors
    ///
    /// Returns an adapter error if the configuration is invalid.
    fn build(&self, credential: &Credential) -> AdapterResult<Arc<dyn ModelAdapter>>;
}

/// Factory for [`AzureOpenAiAdapter`] instances.
#[derive(Clone, Debug)]
pub struct AzureOpenAiFactory {
    settings: AzureSettings,
}

impl AzureOpenAiFactory {
    /// Creates a factory for the supplied endpoint settings.
    #[must_use]
    pub fn new(settings: AzureSettings) -> Self {
        Self { settings }
    }
}

impl AdapterFactory for AzureOpenAiFactory {
    fn build(&self, credential: &Credential) -> AdapterResult<Arc<dyn ModelAdapter>> {
        let config = AzureOpenAiConfig::from_settings(&self.settings)?.with_credential(credential);
        let adapter: Arc<dyn ModelAdapter> = Arc::new(AzureOpenAiAdapter::new(config)?);
        Ok(adapter)
    }
}

/// Inputs of one generate action.
pub struct GenerateRequest<'a> {
    /// Transcript text; `None` when no file was supplied.
    pub transcript: Option<&'a str>,
    /// Resolved credential; `None` when resolution failed.
    pub credential: Option<&'a Credential>,
    /// Shared sampling temperature.
    pub temperature: Temperature,
}

impl fmt::Debug for GenerateRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateRequest")
            .field("transcript_chars", &self.transcript.map(str::len))
            .field("credential", &self.credential.is_some())
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Runs the generate action against adapters built by `F`.
pub struct GenerationPipeline<F> {
    factory: F,
}

impl<F: AdapterFactory> GenerationPipeline<F> {
    /// Creates a pipeline using `factory` to build adapters.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Runs the stages in order and returns every task output.
    ///
    /// Missing inputs are rejected before any adapter is built, so those
    /// checks never touch the network. The probe always precedes the crew.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] tagged with the stage that failed.
    #[instrument(skip_all, fields(temperature = %request.temperature))]
    pub async fn run(
        &self,
        config: &PromptConfig,
        request: GenerateRequest<'_>,
    ) -> PipelineResult<CrewOutput> {
        let transcript = request.transcript.ok_or(PipelineError::MissingTranscript)?;
        let credential = request.credential.ok_or(PipelineError::MissingCredential)?;

        let adapter = self
            .factory
            .build(credential)
            .map_err(PipelineError::connectivity)?;
        probe(adapter.as_ref())
            .await
            .map_err(PipelineError::connectivity)?;

        let crew = Crew::from_config(config, transcript, request.temperature)?;
        info!("generating research article, this may take a few minutes");
        let output = crew.kickoff(adapter.as_ref()).await?;
        info!(chars = output.final_output().len(), "research article generated");
        Ok(output)
    }
}
