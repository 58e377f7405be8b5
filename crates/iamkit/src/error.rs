//! Error types for policy synthesis.

use thiserror::Error;

/// Errors that can occur while building policies.
#[derive(Error, Debug)]
pub enum Error {
    /// Capability name not in the capability table
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A statement with no actions
    #[error("statement {} has no actions", .sid.as_deref().unwrap_or("<unnamed>"))]
    EmptyActions {
        /// Statement id, if set
        sid: Option<String>,
    },

    /// A statement with no resources
    #[error("statement {} has no resources", .sid.as_deref().unwrap_or("<unnamed>"))]
    EmptyResources {
        /// Statement id, if set
        sid: Option<String>,
    },

    /// A bare `*` action outside of an explicit wildcard statement
    #[error("statement {} grants every action; use an explicit wildcard statement", .sid.as_deref().unwrap_or("<unnamed>"))]
    UnscopedWildcard {
        /// Statement id, if set
        sid: Option<String>,
    },

    /// Statement ids may only contain ASCII letters and digits
    #[error("invalid statement id: {0}")]
    InvalidSid(String),

    /// Region or account unusable for ARN interpolation
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for policy operations
pub type Result<T> = std::result::Result<T, Error>;
