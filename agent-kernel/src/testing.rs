//! Fake model adapter shared by the kernel's unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use agent_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    ModelAdapter,
};
use async_trait::async_trait;
use futures::stream;

/// Replays canned answers and records every request it receives.
pub(crate) struct ScriptedAdapter {
    metadata: AdapterMetadata,
    answers: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<InferenceRequest>>,
    failure: Option<(usize, u16)>,
}

impl ScriptedAdapter {
    pub(crate) fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metadata: AdapterMetadata::new("scripted", "test"),
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Answers the first `successes` calls, then fails with `status`.
    pub(crate) fn fail_after(mut self, successes: usize, status: u16) -> Self {
        self.failure = Some((successes, status));
        self
    }

    pub(crate) fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        let seen = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        if let Some((successes, status)) = self.failure {
            if seen > successes {
                return Err(AdapterError::Status {
                    service: "scripted",
                    status,
                    body: format!("scripted failure {status}"),
                });
            }
        }

        let answer = self.answers.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(stream::once(async move {
            Ok(InferenceChunk::new(answer, true))
        })))
    }
}
