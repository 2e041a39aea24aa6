//! The generate action.

use std::io::Write;
use std::sync::Arc;

use agent_adapters::keyvault::key_vault_store;
use agent_config::{
    AzureSettings, ConfigStore, CredentialChain, Environment, InteractiveCredential, Prompter,
    SecretStore,
};
use agent_kernel::{
    AdapterFactory, AzureOpenAiFactory, CrewOutput, GenerateRequest, GenerationPipeline,
    PipelineError,
};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::cli::GenerateArgs;
use crate::commands::load_session;
use crate::prompter::TerminalPrompter;

/// External services used by the generate action.
pub struct Services<F, P> {
    /// Builds the model adapter once a credential is known.
    pub factory: F,
    /// Remote secret store consulted when the API key variable is unset.
    pub secrets: Arc<dyn SecretStore>,
    /// Terminal prompt used as the last credential source, if allowed.
    pub prompter: Option<P>,
}

impl Services<AzureOpenAiFactory, TerminalPrompter> {
    /// Azure-backed services configured from `env`.
    ///
    /// Key Vault misconfiguration is not fatal here: it is reported as a
    /// credential source failure only if the vault is actually consulted.
    #[must_use]
    pub fn azure(env: &Environment, interactive: bool) -> Self {
        Self {
            factory: AzureOpenAiFactory::new(AzureSettings::from_env(env)),
            secrets: key_vault_store(env),
            prompter: interactive.then_some(TerminalPrompter),
        }
    }
}

/// Runs the generate action with Azure services and prints the article.
///
/// # Errors
///
/// See [`execute`].
pub async fn run(
    store: &ConfigStore,
    args: GenerateArgs,
    env: &Environment,
    out: &mut impl Write,
) -> Result<()> {
    let services = Services::azure(env, !args.no_prompt);
    execute(store, args, env, services, out).await?;
    Ok(())
}

/// Runs the generate action.
///
/// Session edits are applied (and saved with `--save`) first. A missing
/// transcript is rejected before any credential source is consulted, so it
/// never triggers a prompt or a network call.
///
/// # Errors
///
/// Returns an error if the transcript cannot be read, no credential is
/// available, the endpoint probe fails, or a task fails.
pub async fn execute<F, P>(
    store: &ConfigStore,
    args: GenerateArgs,
    env: &Environment,
    services: Services<F, P>,
    out: &mut impl Write,
) -> Result<CrewOutput>
where
    F: AdapterFactory,
    P: Prompter + 'static,
{
    // Saving must never replace a file that failed to parse.
    let mut config = if args.save {
        store
            .load_or_default()
            .await
            .with_context(|| format!("refusing to save {}", store.path().display()))?
    } else {
        load_session(store).await?
    };
    for (key, value) in args.sets {
        config.set_field(key, value);
    }
    if args.save {
        store.save(&config).await?;
    }

    let Some(path) = args.transcript else {
        return Err(PipelineError::MissingTranscript.into());
    };
    let transcript = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read transcript {}", path.display()))?;
    if transcript.trim().is_empty() {
        warn!(path = %path.display(), "transcript is empty");
    }

    let mut chain = CredentialChain::automated(env, services.secrets);
    if let Some(prompter) = services.prompter {
        chain = chain.with_source(InteractiveCredential::new(prompter));
    }
    let resolution = chain.resolve().await;

    let pipeline = GenerationPipeline::new(services.factory);
    let request = GenerateRequest {
        transcript: Some(&transcript),
        credential: resolution.credential(),
        temperature: args.temperature,
    };
    let output = match pipeline.run(&config, request).await {
        Ok(output) => output,
        Err(err) => {
            if let Some(status) = err.status_code() {
                error!(
                    stage = %err.stage(),
                    status,
                    body = err.response_body().unwrap_or_default(),
                    "API request failed"
                );
            }
            return Err(err.into());
        }
    };

    match args.output {
        Some(target) => {
            tokio::fs::write(&target, output.final_output())
                .await
                .with_context(|| format!("failed to write article to {}", target.display()))?;
            info!(path = %target.display(), "research article written");
        }
        None => writeln!(out, "{}", output.final_output())?,
    }
    Ok(output)
}
