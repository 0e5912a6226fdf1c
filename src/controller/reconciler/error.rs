//! # Reconcile Errors
//!
//! Errors that cross the reconciler boundary. `NotFound` and create
//! conflicts are handled internally and never show up here.

use crate::accessor::AccessorError;
use std::fmt;
use thiserror::Error;

/// Which write the reconciler attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Create,
    Update,
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOperation::Create => f.write_str("create"),
            WriteOperation::Update => f.write_str("update"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A Secret with the desired name exists but is not owned by the caller.
    /// Terminal: the name collides with a resource outside this controller.
    #[error("owner {owner_kind} {owner_name:?} does not own Secret {namespace}/{name}")]
    NotOwned {
        owner_kind: String,
        owner_name: String,
        namespace: String,
        name: String,
    },

    #[error("failed to get Secret: {0}")]
    ReadFailure(#[source] AccessorError),

    #[error("failed to {operation} Secret: {source}")]
    WriteFailure {
        operation: WriteOperation,
        #[source]
        source: AccessorError,
    },

    /// The owner or desired Secret is missing identifying fields
    #[error("invalid reconcile input: {0}")]
    InvalidInput(String),
}

impl ReconcileError {
    #[must_use]
    pub fn is_not_owned(&self) -> bool {
        matches!(self, ReconcileError::NotOwned { .. })
    }

    /// Whether the outer control loop should requeue with backoff
    ///
    /// Ownership and input errors need a human or policy change; retrying
    /// them cannot succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::ReadFailure(_) | ReconcileError::WriteFailure { .. }
        )
    }

    /// Stable label for metrics
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::NotOwned { .. } => "not_owned",
            ReconcileError::ReadFailure(_) => "read_failure",
            ReconcileError::WriteFailure { .. } => "write_failure",
            ReconcileError::InvalidInput(_) => "invalid_input",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_owned() -> ReconcileError {
        ReconcileError::NotOwned {
            owner_kind: "Service".to_string(),
            owner_name: "ownerObj".to_string(),
            namespace: "default".to_string(),
            name: "secret".to_string(),
        }
    }

    #[test]
    fn test_not_owned_is_terminal() {
        let err = not_owned();
        assert!(err.is_not_owned());
        assert!(!err.is_retryable());
        assert_eq!(err.reason(), "not_owned");
        assert_eq!(
            err.to_string(),
            "owner Service \"ownerObj\" does not own Secret default/secret"
        );
    }

    #[test]
    fn test_write_failure_is_retryable() {
        let err = ReconcileError::WriteFailure {
            operation: WriteOperation::Update,
            source: AccessorError::conflict("default", "secret", "object has been modified"),
        };
        assert!(!err.is_not_owned());
        assert!(err.is_retryable());
        assert_eq!(err.reason(), "write_failure");
        assert!(err.to_string().starts_with("failed to update Secret: "));
    }

    #[test]
    fn test_read_failure_keeps_source() {
        let err = ReconcileError::ReadFailure(AccessorError::Other("cache unavailable".to_string()));
        assert!(err.is_retryable());
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("cache unavailable"));
    }

    #[test]
    fn test_invalid_input_is_terminal() {
        let err = ReconcileError::InvalidInput("owner uid is empty".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.reason(), "invalid_input");
    }
}
