//! Model and service adapters used by the generation crew.
//!
//! [`azure_openai`] implements the shared [`traits::ModelAdapter`] interface
//! against an Azure `OpenAI` deployment; [`keyvault`] and [`identity`] fetch
//! the API key from Azure Key Vault using ambient Azure credentials.

#![warn(missing_docs, clippy::pedantic)]

pub mod azure_openai;
pub mod identity;
pub mod keyvault;
pub mod traits;

mod http_client;
