//! Error types for graph validation and apply.
//!
//! Errors are categorized so callers can tell configuration mistakes
//! (nothing was touched) from failures in the middle of an apply walk
//! (some nodes may already exist).

use crate::types::NodeKind;
use std::fmt;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of provisioning errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing input, detected before any side effect.
    Configuration,
    /// The dependency graph is not acyclic.
    Cycle,
    /// Artifact construction failed.
    Build,
    /// A backend creation call failed, or an ordering invariant broke.
    Provisioning,
}

impl ErrorCategory {
    /// Whether the error was raised before any node was applied.
    #[must_use]
    pub fn is_pre_apply(&self) -> bool {
        matches!(self, Self::Configuration | Self::Cycle)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::Cycle => "Dependency cycle",
            Self::Build => "Build failed",
            Self::Provisioning => "Provisioning failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Fix the stack configuration; nothing was created",
            Self::Cycle => "Remove one of the dependencies on the cycle; nothing was created",
            Self::Build => "Check the build context and build file, then deploy again",
            Self::Provisioning => {
                "Resources applied before the failure were left in place; inspect them before retrying"
            }
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Error raised by a single node's creation contract or validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// Invalid node input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Artifact build failed.
    #[error("build error: {0}")]
    Build(String),

    /// Backend call failed or a dependency was not applied.
    #[error("provisioning error: {0}")]
    Provisioning(String),
}

impl ApplyError {
    /// Get the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Build(_) => ErrorCategory::Build,
            Self::Provisioning(_) => ErrorCategory::Provisioning,
        }
    }
}

/// Errors that can occur while building, planning or applying a graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A node with the same id is already registered.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge, reference or output names a node that is not registered.
    #[error("{context} refers to unknown node '{node}'")]
    UnknownNode {
        /// The missing node id.
        node: String,
        /// What referred to it.
        context: String,
    },

    /// An output binding name is registered twice.
    #[error("duplicate output binding: {0}")]
    DuplicateOutput(String),

    /// The dependency graph contains a cycle.
    #[error("dependency cycle: {}", .cycle.join(" -> "))]
    Cycle {
        /// Node ids along the cycle, first node repeated at the end.
        cycle: Vec<String>,
    },

    /// A node failed validation before anything was applied.
    #[error("invalid {kind} node '{node}': {source}")]
    InvalidNode {
        /// Node id.
        node: String,
        /// Node kind.
        kind: NodeKind,
        /// Underlying error.
        #[source]
        source: ApplyError,
    },

    /// A node failed during the apply walk.
    #[error("{kind} node '{node}' failed: {source}")]
    NodeFailed {
        /// Node id.
        node: String,
        /// Node kind.
        kind: NodeKind,
        /// Underlying error.
        #[source]
        source: ApplyError,
    },

    /// The resolution table already holds a value for this key.
    #[error("resolved value for {node}.{field} written twice")]
    Overwrite {
        /// Node id.
        node: String,
        /// Output field.
        field: String,
    },

    /// An output binding reads a field the node never produced.
    #[error("output '{name}' reads {node}.{field}, which was never produced")]
    MissingOutput {
        /// Output name.
        name: String,
        /// Node id.
        node: String,
        /// Output field.
        field: String,
    },

    /// The confirmation prompt could not be answered; nothing was applied.
    #[error("confirmation failed: {0}")]
    Confirm(String),

    /// Thread pool failure.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateNode(_)
            | Self::UnknownNode { .. }
            | Self::DuplicateOutput(_)
            | Self::InvalidNode { .. }
            | Self::Confirm(_) => ErrorCategory::Configuration,
            Self::Cycle { .. } => ErrorCategory::Cycle,
            Self::NodeFailed { source, .. } => source.category(),
            Self::Overwrite { .. } | Self::MissingOutput { .. } | Self::Other(_) => {
                ErrorCategory::Provisioning
            }
        }
    }

    /// The node this error is about, if any.
    #[must_use]
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::DuplicateNode(node)
            | Self::UnknownNode { node, .. }
            | Self::InvalidNode { node, .. }
            | Self::NodeFailed { node, .. }
            | Self::Overwrite { node, .. }
            | Self::MissingOutput { node, .. } => Some(node),
            Self::DuplicateOutput(_) | Self::Cycle { .. } | Self::Confirm(_) | Self::Other(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_failed_category_follows_source() {
        let err = Error::NodeFailed {
            node: "Image".into(),
            kind: NodeKind::Image,
            source: ApplyError::Build("no Dockerfile".into()),
        };
        assert_eq!(err.category(), ErrorCategory::Build);
        assert_eq!(err.node(), Some("Image"));
        assert!(!err.category().is_pre_apply());
    }

    #[test]
    fn test_cycle_display() {
        let err = Error::Cycle {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
        assert!(err.category().is_pre_apply());
    }

    #[test]
    fn test_invalid_node_is_configuration() {
        let err = Error::InvalidNode {
            node: "Role".into(),
            kind: NodeKind::Identity,
            source: ApplyError::Configuration("no statements".into()),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("identity node 'Role'"));
    }

    #[test]
    fn test_confirm_failure_is_pre_apply() {
        let err = Error::Confirm("not a terminal".into());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.category().is_pre_apply());
        assert_eq!(err.node(), None);
    }
}
