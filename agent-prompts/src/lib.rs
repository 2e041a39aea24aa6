//! Prompt construction for the generation crew.
//!
//! [`template`] is a small strict `{{variable}}` renderer; [`crew`] holds the
//! fixed prompt shapes used for agent personas and task messages.

#![warn(missing_docs, clippy::pedantic)]

pub mod crew;
pub mod template;

pub use crew::{agent_system_prompt, task_prompt};
pub use template::{PromptTemplate, TemplateError, TemplateResult};
