//! Configuration management for the article generator.
//!
//! Covers the persisted prompt configuration, environment-derived endpoint
//! settings, and the ordered credential resolution chain.

#![warn(missing_docs, clippy::pedantic)]

pub mod credentials;
pub mod env;
mod error;
pub mod loader;
pub mod schema;
pub mod settings;

pub use credentials::{
    CredentialChain, CredentialError, CredentialResult, CredentialSource, EnvCredential,
    InteractiveCredential, Prompter, Resolution, SecretStore, SecretStoreCredential,
    SourceFailure, resolve_credential,
};
pub use env::Environment;
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigStore, DEFAULT_CONFIG_PATH};
pub use schema::{AgentField, AgentPrompt, FieldKey, PromptConfig, TaskPrompts};
pub use settings::{AzureSettings, Temperature};
