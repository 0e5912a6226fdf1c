//! # Secret Reconciler
//!
//! Brings a Secret owned by a primary resource into agreement with a desired body.
//!
//! One call performs a single cached read, an ownership check, a payload
//! comparison and at most one write:
//!
//! 1. **Not cached** - create the Secret with a controller OwnerReference for
//!    the owner. If the create loses a race (409), re-read from the API server
//!    and continue as if the Secret had been found.
//! 2. **Found, not controlled by the owner** - fail with
//!    [`ReconcileError::NotOwned`] without writing.
//! 3. **Found, same payload** - return it unchanged.
//! 4. **Found, different payload** - replace `data` only, keeping every other
//!    field (including `resourceVersion`) from the observed object, and update.
//!
//! The reconciler holds no state and takes no locks. Concurrent calls converge
//! through idempotence and the API server's optimistic concurrency.

pub mod error;
pub mod payload;

pub use error::{ReconcileError, WriteOperation};

use crate::accessor::{AccessorError, SecretAccessor, SecretEvent};
use crate::controller::owner::{controller_of, ensure_controller_ref, Owner};
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use payload::{desired_payload, payload_equal};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// What a successful reconciliation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Unchanged,
}

impl ReconcileOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Created => "created",
            ReconcileOutcome::Updated => "updated",
            ReconcileOutcome::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ensure the Secret described by `desired` exists, is owned by `owner` and
/// carries `desired`'s payload
///
/// `desired` is never modified. Returns the Secret as stored in the cluster
/// (or as last observed, when nothing had to change).
pub async fn reconcile_secret(
    owner: &Owner,
    desired: &Secret,
    accessor: &dyn SecretAccessor,
) -> Result<Secret, ReconcileError> {
    reconcile_secret_with_outcome(owner, desired, accessor)
        .await
        .map(|(secret, _)| secret)
}

/// Same as [`reconcile_secret`], also reporting which branch was taken
pub async fn reconcile_secret_with_outcome(
    owner: &Owner,
    desired: &Secret,
    accessor: &dyn SecretAccessor,
) -> Result<(Secret, ReconcileOutcome), ReconcileError> {
    let start = Instant::now();
    let (namespace, name) = match validate_input(owner, desired) {
        Ok(key) => key,
        Err(e) => {
            metrics::increment_reconciliation_errors(e.reason());
            return Err(e);
        }
    };

    let span = tracing::span!(
        tracing::Level::INFO,
        "secret.reconcile",
        secret.namespace = namespace,
        secret.name = name,
        owner.kind = %owner.kind,
        owner.name = %owner.name
    );

    let result = reconcile_inner(owner, desired, namespace, name, accessor)
        .instrument(span)
        .await;

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    match &result {
        Ok((_, outcome)) => metrics::increment_reconciliations(outcome.as_str()),
        Err(e) => metrics::increment_reconciliation_errors(e.reason()),
    }
    result
}

async fn reconcile_inner(
    owner: &Owner,
    desired: &Secret,
    namespace: &str,
    name: &str,
    accessor: &dyn SecretAccessor,
) -> Result<(Secret, ReconcileOutcome), ReconcileError> {
    let observed = match accessor.secret_lister().get(namespace, name) {
        Ok(secret) => secret,
        Err(e) if e.is_not_found() => match create_secret(owner, desired, accessor).await {
            Ok(created) => return Ok((created, ReconcileOutcome::Created)),
            Err(CreateError::Conflict(e)) => {
                metrics::increment_create_conflicts();
                info!(
                    "Secret {}/{} was created concurrently ({}), re-reading from the API server",
                    namespace, name, e
                );
                accessor
                    .kube_client()
                    .get(namespace, name)
                    .await
                    .map_err(ReconcileError::ReadFailure)?
            }
            Err(CreateError::Failed(e)) => return Err(e),
        },
        Err(e) => return Err(ReconcileError::ReadFailure(e)),
    };

    if !owner.owns(&observed.metadata) {
        warn!(
            "Secret {}/{} exists but is not owned by {} {:?}, refusing to modify it",
            namespace, name, owner.kind, owner.name
        );
        return Err(ReconcileError::NotOwned {
            owner_kind: owner.kind.clone(),
            owner_name: owner.name.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
    }

    let payload = desired_payload(desired);
    if payload_equal(observed.data.as_ref(), payload.as_ref()) {
        debug!("Secret {}/{} is up to date", namespace, name);
        return Ok((observed, ReconcileOutcome::Unchanged));
    }

    // `observed` is our own copy; only the payload changes, metadata (and its
    // resourceVersion) is sent back as read.
    let mut changed = observed;
    changed.data = payload;
    changed.string_data = None;

    match accessor.kube_client().update(&changed).await {
        Ok(updated) => {
            info!("✅ Updated Secret {}/{}", namespace, name);
            publish(accessor, owner, SecretEvent::updated(namespace, name)).await;
            Ok((updated, ReconcileOutcome::Updated))
        }
        Err(e) => {
            warn!("Failed to update Secret {}/{}: {}", namespace, name, e);
            publish(
                accessor,
                owner,
                SecretEvent::update_failed(namespace, name, &e),
            )
            .await;
            Err(ReconcileError::WriteFailure {
                operation: WriteOperation::Update,
                source: e,
            })
        }
    }
}

enum CreateError {
    Conflict(AccessorError),
    Failed(ReconcileError),
}

async fn create_secret(
    owner: &Owner,
    desired: &Secret,
    accessor: &dyn SecretAccessor,
) -> Result<Secret, CreateError> {
    let secret = new_owned_secret(owner, desired);
    let namespace = secret.metadata.namespace.as_deref().unwrap_or_default();
    let name = secret.metadata.name.as_deref().unwrap_or_default();

    match accessor.kube_client().create(&secret).await {
        Ok(created) => {
            info!("✅ Created Secret {}/{}", namespace, name);
            publish(accessor, owner, SecretEvent::created(namespace, name)).await;
            Ok(created)
        }
        Err(e) if e.is_conflict() => Err(CreateError::Conflict(e)),
        Err(e) => {
            warn!("Failed to create Secret {}/{}: {}", namespace, name, e);
            publish(
                accessor,
                owner,
                SecretEvent::creation_failed(namespace, name, &e),
            )
            .await;
            Err(CreateError::Failed(ReconcileError::WriteFailure {
                operation: WriteOperation::Create,
                source: e,
            }))
        }
    }
}

/// Secret body sent on create: `desired` with a controller reference for
/// `owner` and without server-assigned metadata
#[must_use]
pub fn new_owned_secret(owner: &Owner, desired: &Secret) -> Secret {
    let mut secret = desired.clone();
    ensure_controller_ref(&mut secret.metadata, owner);
    secret.metadata.resource_version = None;
    secret.metadata.uid = None;
    secret.metadata.creation_timestamp = None;
    secret.metadata.managed_fields = None;
    secret.data = desired_payload(desired);
    secret.string_data = None;
    secret
}

async fn publish(accessor: &dyn SecretAccessor, owner: &Owner, event: SecretEvent) {
    let Some(publisher) = accessor.event_publisher() else {
        return;
    };
    if let Err(e) = publisher.publish(owner, &event).await {
        warn!(
            "Failed to publish {} event on {} {:?}: {}",
            event.reason, owner.kind, owner.name, e
        );
    }
}

fn validate_input<'a>(
    owner: &Owner,
    desired: &'a Secret,
) -> Result<(&'a str, &'a str), ReconcileError> {
    if owner.name.is_empty() || owner.kind.is_empty() || owner.uid.is_empty() {
        return Err(ReconcileError::InvalidInput(format!(
            "owner must have kind, name and uid (got kind={:?}, name={:?}, uid={:?})",
            owner.kind, owner.name, owner.uid
        )));
    }
    let namespace = desired
        .metadata
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .ok_or_else(|| {
            ReconcileError::InvalidInput("desired Secret has no namespace".to_string())
        })?;
    let name = desired
        .metadata
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ReconcileError::InvalidInput("desired Secret has no name".to_string()))?;
    // A Secret can have only one controller
    if let Some(controller) = controller_of(&desired.metadata) {
        if controller.uid != owner.uid {
            return Err(ReconcileError::InvalidInput(format!(
                "desired Secret {namespace}/{name} is controlled by {} {:?}, not {} {:?}",
                controller.kind, controller.name, owner.kind, owner.name
            )));
        }
    }
    Ok((namespace, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    fn owner() -> Owner {
        Owner::new("v1", "Service", "ownerObj", "abcd").with_namespace("default")
    }

    fn desired() -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("secret".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                "test-secret".to_string(),
                ByteString(b"desired".to_vec()),
            )])),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_owned_secret_adds_controller_ref() {
        let secret = new_owned_secret(&owner(), &desired());
        assert_eq!(
            secret.metadata.owner_references,
            Some(vec![owner().controller_owner_ref()])
        );
        assert_eq!(secret.data, desired().data);
    }

    #[test]
    fn test_new_owned_secret_keeps_existing_owner_ref() {
        let mut body = desired();
        body.metadata.owner_references = Some(vec![OwnerReference {
            kind: "Service".to_string(),
            name: "ownerObj".to_string(),
            uid: "abcd".to_string(),
            controller: Some(true),
            ..Default::default()
        }]);
        let secret = new_owned_secret(&owner(), &body);
        assert_eq!(secret.metadata.owner_references, body.metadata.owner_references);
    }

    #[test]
    fn test_new_owned_secret_strips_server_fields() {
        let mut body = desired();
        body.metadata.resource_version = Some("42".to_string());
        body.metadata.uid = Some("server-uid".to_string());
        let secret = new_owned_secret(&owner(), &body);
        assert!(secret.metadata.resource_version.is_none());
        assert!(secret.metadata.uid.is_none());
        // The caller's body is untouched
        assert_eq!(body.metadata.resource_version.as_deref(), Some("42"));
    }

    #[test]
    fn test_validate_input_rejects_missing_uid() {
        let owner = Owner::new("v1", "Service", "ownerObj", "");
        let err = validate_input(&owner, &desired()).unwrap_err();
        assert_eq!(err.reason(), "invalid_input");
    }

    #[test]
    fn test_validate_input_rejects_missing_namespace() {
        let mut body = desired();
        body.metadata.namespace = None;
        assert!(matches!(
            validate_input(&owner(), &body),
            Err(ReconcileError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_input_rejects_foreign_controller() {
        let mut body = desired();
        body.metadata.owner_references =
            Some(vec![Owner::new("v1", "Service", "other", "efgh").controller_owner_ref()]);
        let err = validate_input(&owner(), &body).unwrap_err();
        assert!(err.to_string().contains("\"other\""));

        // A non-controller reference to someone else is fine
        body.metadata.owner_references.as_mut().unwrap()[0].controller = None;
        assert!(validate_input(&owner(), &body).is_ok());
        let secret = new_owned_secret(&owner(), &body);
        assert_eq!(
            controller_of(&secret.metadata).map(|r| r.uid.as_str()),
            Some("abcd")
        );
    }

    #[test]
    fn test_validate_input_returns_key() {
        let body = desired();
        let (namespace, name) = validate_input(&owner(), &body).unwrap();
        assert_eq!((namespace, name), ("default", "secret"));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(ReconcileOutcome::Created.to_string(), "created");
        assert_eq!(ReconcileOutcome::Updated.as_str(), "updated");
        assert_eq!(ReconcileOutcome::Unchanged.as_str(), "unchanged");
    }
}
