// SPDX-License-Identifier: MIT

//! Typed error handling for docflow-rs
//!
//! `WorkflowError` covers everything that can abort a run. Notification
//! failures have their own type because the notify step swallows them.

use thiserror::Error;

/// Boxed error returned by collaborators (models, loaders, persisters...)
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for docflow-rs
#[derive(Debug, Error)]
pub enum DocflowError {
    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow execution errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

/// Errors raised while building or running a workflow graph
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// An external collaborator (model, loader, persister) failed
    #[error("Collaborator call failed at node '{node}': {message}")]
    Collaborator { node: String, message: String },

    /// A router produced a label with no edge in its table
    #[error("Node '{node}' routed to label '{label}' which has no edge")]
    Routing { node: String, label: String },

    /// The review step could not obtain a decision from the reviewer
    #[error("Human input unavailable: {0}")]
    InputUnavailable(String),

    /// The operator interrupted the run
    #[error("Run interrupted by operator")]
    Interrupted,

    /// The graph definition is inconsistent
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// A node that needs a document type ran before classification
    #[error("Document type is unresolved at node '{0}'")]
    Unclassified(String),
}

/// Delivery failure inside the notify step; logged, never propagated
#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotificationError(pub String);

impl DocflowError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the run was stopped by the operator rather than by a failure
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Workflow(e) if e.is_interrupt())
    }
}

impl WorkflowError {
    /// Wrap a collaborator failure with the node it happened at
    pub fn collaborator(node: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Collaborator {
            node: node.into(),
            message: err.to_string(),
        }
    }

    /// Whether the run was stopped by the operator rather than by a failure
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl From<&str> for DocflowError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for DocflowError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<BoxError> for DocflowError {
    fn from(err: BoxError) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_names_node() {
        let err = WorkflowError::collaborator("classify", "connection refused");
        assert_eq!(
            err.to_string(),
            "Collaborator call failed at node 'classify': connection refused"
        );
    }

    #[test]
    fn test_workflow_error_converts_to_top_level() {
        let err: DocflowError = WorkflowError::Interrupted.into();
        assert!(matches!(
            err,
            DocflowError::Workflow(WorkflowError::Interrupted)
        ));
        assert!(err.is_interrupt());
        assert!(!DocflowError::config("bad provider").is_interrupt());
    }

    #[test]
    fn test_box_error_conversion() {
        let boxed: BoxError = "boom".into();
        let err: DocflowError = boxed.into();
        assert_eq!(err.to_string(), "boom");
    }
}
