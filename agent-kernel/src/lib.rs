//! Crew execution and the generate pipeline.
//!
//! The pipeline validates inputs, probes the model endpoint, assembles the
//! planner/writer/editor crew from a prompt configuration, and runs the three
//! tasks sequentially against a [`ModelAdapter`](agent_adapters::traits::ModelAdapter).

#![warn(missing_docs, clippy::pedantic)]

mod crew;
mod error;
mod pipeline;
mod probe;

#[cfg(test)]
mod testing;

pub use crew::{Agent, ConstructionError, Crew, CrewOutput, ExecutionError, Task, TaskOutput};
pub use error::{PipelineError, PipelineResult, PipelineStage};
pub use pipeline::{AdapterFactory, AzureOpenAiFactory, GenerateRequest, GenerationPipeline};
pub use probe::{PROBE_MESSAGE, probe};
