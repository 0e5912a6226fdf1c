//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use secret_reconciler::prelude::*;
//! ```

// Accessor capabilities
pub use crate::accessor::{
    AccessorError, EventPublisher, KubeSecretAccessor, SecretAccessor, SecretClient, SecretEvent,
    SecretEventType, SecretLister,
};

// Reconciler types - core functionality
pub use crate::controller::owner::Owner;
pub use crate::controller::reconciler::{
    reconcile_secret, reconcile_secret_with_outcome, ReconcileError, ReconcileOutcome,
    WriteOperation,
};

// Config types
pub use crate::config::ReconcilerConfig;
