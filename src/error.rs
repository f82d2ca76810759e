//! Typed errors for the reconciliation model.
//!
//! Process plumbing (sockets, child processes, X11 setup) uses `anyhow`. The
//! operations a user triggers return `ManagerError` so the manager can tell a
//! rejected input apart from a failed mode switch.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    /// Malformed resolution or label input. Nothing was mutated.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The referenced monitor or saved configuration does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A configuration file could not be read or written.
    #[error("Failed to access {}: {reason}", path.display())]
    Persistence {
        path: PathBuf,
        reason: String,
    },

    /// The display backend refused or failed an operation.
    #[error("Display backend error: {0}")]
    Capability(String),
}

impl ManagerError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn capability(reason: impl std::fmt::Display) -> Self {
        Self::Capability(reason.to_string())
    }

    pub fn persistence(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
