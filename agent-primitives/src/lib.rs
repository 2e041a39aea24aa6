//! Core shared types for the research article generator.

#![warn(missing_docs, clippy::pedantic)]

mod credential;
mod error;
mod roles;

/// Secret token authorizing calls to the model endpoint.
pub use credential::Credential;
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Fixed agent roles and task kinds that make up the generation crew.
pub use roles::{AgentRole, TaskKind};
