//! Pipeline error taxonomy.

use std::fmt;

use agent_adapters::traits::AdapterError;
use thiserror::Error;

use crate::crew::{ConstructionError, ExecutionError};

/// Stage at which the pipeline stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    /// Input checks before any network traffic.
    Validation,
    /// No credential was available.
    Credential,
    /// Adapter setup or the connectivity probe.
    Connectivity,
    /// Agent and task assembly.
    Construction,
    /// Running the crew.
    Execution,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::Credential => "credential",
            Self::Connectivity => "connectivity",
            Self::Construction => "construction",
            Self::Execution => "execution",
        })
    }
}

/// Reason the generate action stopped.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No transcript was supplied.
    #[error("Please upload a transcript file.")]
    MissingTranscript,

    /// No credential could be resolved.
    #[error("Please enter your Azure OpenAI API Key.")]
    MissingCredential,

    /// The adapter could not be built or the probe failed.
    #[error("Azure OpenAI setup error: {source}")]
    Connectivity {
        /// Adapter failure.
        #[source]
        source: AdapterError,
    },

    /// Agents or tasks could not be assembled.
    #[error("error in agent/task setup: {source}")]
    Construction {
        /// Construction failure.
        #[from]
        source: ConstructionError,
    },

    /// A task failed while the crew was running.
    #[error(transparent)]
    Execution {
        /// Execution failure.
        #[from]
        source: ExecutionError,
    },
}

impl PipelineError {
    /// Wraps an adapter failure raised during setup or probing.
    #[must_use]
    pub fn connectivity(source: AdapterError) -> Self {
        Self::Connectivity { source }
    }

    /// The stage that produced this error.
    #[must_use]
    pub const fn stage(&self) -> PipelineStage {
        match self {
            Self::MissingTranscript => PipelineStage::Validation,
            Self::MissingCredential => PipelineStage::Credential,
            Self::Connectivity { .. } => PipelineStage::Connectivity,
            Self::Construction { .. } => PipelineStage::Construction,
            Self::Execution { .. } => PipelineStage::Execution,
        }
    }

    fn adapter_error(&self) -> Option<&AdapterError> {
        match self {
            Self::Connectivity { source } => Some(source),
            Self::Execution { source } => Some(&source.source),
            _ => None,
        }
    }

    /// HTTP status code of the failing response, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.adapter_error().and_then(AdapterError::status_code)
    }

    /// Body of the failing response, if any.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        self.adapter_error().and_then(AdapterError::response_body)
    }
}

/// Result alias for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;
