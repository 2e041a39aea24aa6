//! Research article generator.
//!
//! Bundles the runtime crates behind one facade and provides the command
//! line front-end: prompt configuration editing and the generate action.

#![warn(missing_docs, clippy::pedantic)]

pub mod cli;
pub mod commands;
pub mod prompter;

/// Shared primitives: credentials, agent roles, and task kinds.
pub use agent_primitives as primitives;

/// Crew execution and the generate pipeline.
pub use agent_kernel as kernel;

/// Azure OpenAI, identity, and Key Vault clients.
pub use agent_adapters as adapters;

/// Tracing subscriber setup.
pub use agent_telemetry as telemetry;

/// Prompt templates.
pub use agent_prompts as prompts;

/// Prompt configuration, settings, and credential resolution.
pub use agent_config as config;
