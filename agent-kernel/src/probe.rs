//! Connectivity probe run before the pipeline.

use agent_adapters::traits::{
    AdapterResult, InferenceRequest, MessageRole, ModelAdapter, PromptMessage,
};
use tracing::{debug, info};

use crate::crew::collect_answer;

/// Content of the probe message.
pub const PROBE_MESSAGE: &str = "Test connection.";
const PROBE_MAX_TOKENS: u32 = 5;

/// Sends a minimal chat request to confirm the endpoint is reachable and
/// accepts the credential.
///
/// # Errors
///
/// Returns the adapter error unchanged; HTTP failures keep their status code
/// and body.
pub async fn probe(adapter: &dyn ModelAdapter) -> AdapterResult<()> {
    let metadata = adapter.metadata();
    debug!(
        provider = metadata.provider(),
        model = metadata.model(),
        "probing model endpoint"
    );

    let request = InferenceRequest::new(vec![PromptMessage::new(MessageRole::System, PROBE_MESSAGE)])?
        .with_max_output_tokens(PROBE_MAX_TOKENS);
    collect_answer(adapter, request).await?;

    info!(model = metadata.model(), "model endpoint reachable");
    Ok(())
}
