//! Error types for backend operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building images or calling backends
#[derive(Error, Debug)]
pub enum Error {
    /// Build context directory does not exist
    #[error("build context does not exist: {}", .0.display())]
    ContextNotFound(PathBuf),

    /// Build file missing from the context directory
    #[error("build file not found: {}", .0.display())]
    BuildFileNotFound(PathBuf),

    /// External executable not on PATH
    #[error("'{0}' not found; is it installed and on PATH?")]
    CommandNotFound(String),

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// Backend returned output we could not interpret
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// Request rejected before calling the backend
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Policy rendering error
    #[error("policy error: {0}")]
    Policy(#[from] iamkit::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an error from a failed command's stderr.
    pub fn from_command_output(program: &str, action: &str, stderr: &str) -> Self {
        Error::CommandFailed {
            message: format!("{program} {action}"),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;
