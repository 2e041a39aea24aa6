//! Shared error definitions for agent primitives.

use thiserror::Error;

/// Result alias used throughout the primitives crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The supplied name does not match any known agent role.
    #[error("unknown agent role `{name}` (expected planner, writer, or editor)")]
    UnknownRole {
        /// The offending name.
        name: String,
    },

    /// The supplied name does not match any known task.
    #[error("unknown task `{name}` (expected plan, write, or edit)")]
    UnknownTask {
        /// The offending name.
        name: String,
    },

    /// A credential was constructed from blank input.
    #[error("credential must not be empty")]
    EmptyCredential,
}
