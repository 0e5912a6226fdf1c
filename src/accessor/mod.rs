//! # Secret Accessor
//!
//! Capabilities the reconciler needs to observe and mutate Secrets.
//!
//! - [`SecretLister`]: cached point lookup (reflector store, possibly stale)
//! - [`SecretClient`]: authoritative reads and writes against the API server
//! - [`EventPublisher`]: optional sink for Kubernetes Events on the owner
//!
//! [`SecretAccessor`] bundles them so a single value can be injected into
//! [`reconcile_secret`](crate::controller::reconciler::reconcile_secret).
//! [`KubeSecretAccessor`] is the production implementation; the in-memory
//! fake lives in [`crate::testing`].

pub mod cluster;
pub mod error;
pub mod event;

pub use cluster::KubeSecretAccessor;
pub use error::AccessorError;
pub use event::{SecretEvent, SecretEventType};

use crate::controller::owner::Owner;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;

/// Cached read capability
///
/// Lookups never hit the network; a missing entry is reported as
/// [`AccessorError::NotFound`].
pub trait SecretLister: Send + Sync {
    /// Get the cached Secret at `namespace/name`
    fn get(&self, namespace: &str, name: &str) -> Result<Secret, AccessorError>;
}

/// Authoritative read/write capability
///
/// `create` reports an existing object as [`AccessorError::Conflict`].
/// `update` carries the Secret's `resourceVersion`, so an update based on a
/// stale read also fails with [`AccessorError::Conflict`].
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Read the Secret straight from the API server, bypassing the cache
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, AccessorError>;

    async fn create(&self, secret: &Secret) -> Result<Secret, AccessorError>;

    async fn update(&self, secret: &Secret) -> Result<Secret, AccessorError>;
}

/// Event sink for the owning resource
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, owner: &Owner, event: &SecretEvent) -> Result<(), AccessorError>;
}

/// Capability bundle handed to the reconciler
pub trait SecretAccessor: Send + Sync {
    fn secret_lister(&self) -> &dyn SecretLister;

    fn kube_client(&self) -> &dyn SecretClient;

    /// Event sink, if the accessor records events
    fn event_publisher(&self) -> Option<&dyn EventPublisher> {
        None
    }
}
