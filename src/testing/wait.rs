//! # Cache Polling
//!
//! Block until the Secret cache reflects a write.

use crate::accessor::{AccessorError, SecretLister};
use crate::config::ReconcilerConfig;
use crate::constants::{DEFAULT_CACHE_POLL_INTERVAL_MS, DEFAULT_CACHE_PROPAGATION_TIMEOUT_SECS};
use crate::controller::owner::is_controlled_by;
use crate::controller::reconciler::payload::{desired_payload, payload_equal};
use k8s_openapi::api::core::v1::Secret;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// How often and how long to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_CACHE_POLL_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_CACHE_PROPAGATION_TIMEOUT_SECS),
        }
    }
}

impl From<&ReconcilerConfig> for PollOptions {
    fn from(config: &ReconcilerConfig) -> Self {
        Self {
            interval: config.cache_poll_interval(),
            timeout: config.cache_propagation_timeout(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timed out after {timeout:?} waiting for Secret {namespace}/{name} to propagate")]
    Timeout {
        namespace: String,
        name: String,
        timeout: Duration,
        last_seen: Option<Box<Secret>>,
    },

    #[error("failed to read Secret while waiting: {0}")]
    Read(#[source] AccessorError),
}

/// Poll `lister` until the Secret at `namespace/name` satisfies `predicate`
///
/// The first check happens immediately. A missing Secret keeps polling; any
/// other read error stops the wait.
pub async fn wait_for_secret<F>(
    lister: &dyn SecretLister,
    namespace: &str,
    name: &str,
    options: PollOptions,
    predicate: F,
) -> Result<Secret, WaitError>
where
    F: Fn(&Secret) -> bool,
{
    let deadline = Instant::now() + options.timeout;
    let mut last_seen = None;
    loop {
        match lister.get(namespace, name) {
            Ok(secret) if predicate(&secret) => return Ok(secret),
            Ok(secret) => last_seen = Some(Box::new(secret)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(WaitError::Read(e)),
        }
        if Instant::now() >= deadline {
            return Err(WaitError::Timeout {
                namespace: namespace.to_string(),
                name: name.to_string(),
                timeout: options.timeout,
                last_seen,
            });
        }
        tokio::time::sleep(options.interval).await;
    }
}

/// Whether `observed` matches `desired` in everything the caller controls:
/// name, namespace, payload and OwnerReferences
///
/// Server-assigned metadata (`resourceVersion`, `uid`) is ignored.
#[must_use]
pub fn matches_desired(observed: &Secret, desired: &Secret) -> bool {
    observed.metadata.name == desired.metadata.name
        && observed.metadata.namespace == desired.metadata.namespace
        && payload_equal(observed.data.as_ref(), desired_payload(desired).as_ref())
        && observed.metadata.owner_references == desired.metadata.owner_references
}

/// Whether `observed` carries `desired`'s payload and is controlled by `owner_uid`
#[must_use]
pub fn has_payload_and_owner(observed: &Secret, desired: &Secret, owner_uid: &str) -> bool {
    payload_equal(observed.data.as_ref(), desired_payload(desired).as_ref())
        && is_controlled_by(&observed.metadata, owner_uid)
}
