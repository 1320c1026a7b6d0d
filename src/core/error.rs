//! Error types for git exclude operations.
//!
//! Uses thiserror for derive macros. Each variant corresponds to one failure
//! category of the exclude engine and the git state classifier.

use std::path::PathBuf;
use thiserror::Error;

use crate::builders::validator::RejectReason;

/// Main error type for exclude file and git state operations.
#[derive(Error, Debug)]
pub enum GitExcludeError {
    /// The path failed validation. Only the offending path is affected.
    #[error("Invalid exclude path {path:?}: {message}")]
    Validation {
        path: String,
        reason: RejectReason,
        message: String,
    },

    /// The exclude file could not be read, written or removed.
    #[error("Cannot access exclude file '{}': {message}", .path.display())]
    Access { path: PathBuf, message: String },

    /// The exclude file content is malformed, binary or oversized.
    #[error("Exclude file is corrupted: {0}")]
    Corruption(String),

    /// Exclude operations are administratively disabled.
    #[error("Git exclude operations are disabled ({operation}: {})", .paths.join(", "))]
    Disabled {
        operation: String,
        paths: Vec<String>,
    },

    /// A git precondition or status query failed.
    #[error("Git operation failed: {0}")]
    Operation(String),

    /// The target directory is not a git repository.
    #[error("Git repository not found at '{}'", .0.display())]
    RepositoryNotFound(PathBuf),
}

impl GitExcludeError {
    /// Returns false for failures that a plain retry cannot fix.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            GitExcludeError::Access { .. } | GitExcludeError::RepositoryNotFound(_)
        )
    }

    pub(crate) fn access(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        GitExcludeError::Access {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for exclude operations.
pub type Result<T> = std::result::Result<T, GitExcludeError>;
