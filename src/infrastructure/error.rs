//! Infrastructure-level errors (wraps application errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("path resolution failed: {path}: {reason}")]
    PathResolution { path: PathBuf, reason: String },

    #[error("invalid scenario {path}: {reason}")]
    Scenario { path: PathBuf, reason: String },

    #[error("picker failed: {message}")]
    Picker { message: String },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a scenario error with file context.
    pub fn scenario(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Scenario {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
