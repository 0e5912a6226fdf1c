//! # Secret Events
//!
//! Kubernetes Events recorded on the owning resource when the reconciler
//! creates or updates a Secret, or fails to.

use crate::constants::{
    EVENT_ACTION_RECONCILE_SECRET, EVENT_REASON_CREATED, EVENT_REASON_CREATION_FAILED,
    EVENT_REASON_UPDATED, EVENT_REASON_UPDATE_FAILED,
};
use std::fmt;

/// Event severity, mirrors the Kubernetes `Normal`/`Warning` event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretEventType {
    Normal,
    Warning,
}

impl fmt::Display for SecretEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretEventType::Normal => f.write_str("Normal"),
            SecretEventType::Warning => f.write_str("Warning"),
        }
    }
}

/// A single event about a Secret, published on its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEvent {
    pub type_: SecretEventType,
    pub reason: &'static str,
    pub action: &'static str,
    pub note: String,
}

impl SecretEvent {
    #[must_use]
    pub fn created(namespace: &str, name: &str) -> Self {
        Self {
            type_: SecretEventType::Normal,
            reason: EVENT_REASON_CREATED,
            action: EVENT_ACTION_RECONCILE_SECRET,
            note: format!("Created Secret {namespace}/{name}"),
        }
    }

    #[must_use]
    pub fn creation_failed(namespace: &str, name: &str, error: &dyn fmt::Display) -> Self {
        Self {
            type_: SecretEventType::Warning,
            reason: EVENT_REASON_CREATION_FAILED,
            action: EVENT_ACTION_RECONCILE_SECRET,
            note: format!("Failed to create Secret {namespace}/{name}: {error}"),
        }
    }

    #[must_use]
    pub fn updated(namespace: &str, name: &str) -> Self {
        Self {
            type_: SecretEventType::Normal,
            reason: EVENT_REASON_UPDATED,
            action: EVENT_ACTION_RECONCILE_SECRET,
            note: format!("Updated Secret {namespace}/{name}"),
        }
    }

    #[must_use]
    pub fn update_failed(namespace: &str, name: &str, error: &dyn fmt::Display) -> Self {
        Self {
            type_: SecretEventType::Warning,
            reason: EVENT_REASON_UPDATE_FAILED,
            action: EVENT_ACTION_RECONCILE_SECRET,
            note: format!("Failed to update Secret {namespace}/{name}: {error}"),
        }
    }
}
