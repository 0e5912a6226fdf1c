//! # Kubernetes Secret Accessor
//!
//! Production [`SecretAccessor`]: cached reads from a reflector store kept in
//! sync by a background watch, writes through `Api<Secret>`, and events
//! through the `kube` event recorder.

use super::{
    AccessorError, EventPublisher, SecretAccessor, SecretClient, SecretEvent, SecretEventType,
    SecretLister,
};
use crate::config::ReconcilerConfig;
use crate::controller::owner::Owner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use kube::Client;
use kube_runtime::events::{Event, EventType, Recorder, Reporter};
use kube_runtime::reflector::{self, ObjectRef, Store};
use kube_runtime::{watcher, WatchStreamExt};
use std::fmt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Secret accessor backed by the Kubernetes API
pub struct KubeSecretAccessor {
    client: Client,
    store: Store<Secret>,
    recorder: Recorder,
    field_manager: String,
    reflector_task: Option<JoinHandle<()>>,
}

impl fmt::Debug for KubeSecretAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeSecretAccessor")
            .field("field_manager", &self.field_manager)
            .field("cached_secrets", &self.store.state().len())
            .finish_non_exhaustive()
    }
}

impl KubeSecretAccessor {
    /// Start watching Secrets and return an accessor reading from the resulting cache
    ///
    /// The watch runs on the current tokio runtime until the accessor is dropped.
    /// Call [`wait_until_ready`](Self::wait_until_ready) before the first reconcile.
    #[must_use]
    pub fn start(client: Client, config: &ReconcilerConfig) -> Self {
        let api: Api<Secret> = match config.watch_namespace.as_deref() {
            Some(namespace) => Api::namespaced(client.clone(), namespace),
            None => Api::all(client.clone()),
        };
        let (store, writer) = reflector::store();

        let stream = watcher(api, watcher::Config::default())
            .default_backoff()
            .reflect(writer)
            .applied_objects();
        let reflector_task = tokio::spawn(async move {
            stream
                .for_each(|event| async move {
                    if let Err(e) = event {
                        warn!("Secret watch error: {}", e);
                    }
                })
                .await;
            warn!("Secret watch stream ended");
        });

        let mut accessor = Self::from_store(client, store, config);
        accessor.reflector_task = Some(reflector_task);
        accessor
    }

    /// Build an accessor over an existing store
    ///
    /// Useful when the caller already runs a reflector for Secrets (for
    /// example as part of a `kube_runtime::Controller` with `.owns()`).
    #[must_use]
    pub fn from_store(client: Client, store: Store<Secret>, config: &ReconcilerConfig) -> Self {
        let reporter = Reporter {
            controller: config.event_reporter.clone(),
            instance: config.pod_name.clone(),
        };
        Self {
            recorder: Recorder::new(client.clone(), reporter),
            client,
            store,
            field_manager: config.field_manager.clone(),
            reflector_task: None,
        }
    }

    /// Wait for the initial list of Secrets to land in the cache
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.store.wait_until_ready())
            .await
            .context("Timed out waiting for the Secret cache to sync")?
            .context("Secret cache writer was dropped before the initial sync")?;
        info!("✅ Secret cache synced ({} Secrets)", self.store.state().len());
        Ok(())
    }

    #[must_use]
    pub fn store(&self) -> &Store<Secret> {
        &self.store
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

impl Drop for KubeSecretAccessor {
    fn drop(&mut self) {
        if let Some(task) = self.reflector_task.take() {
            task.abort();
        }
    }
}

impl SecretLister for KubeSecretAccessor {
    fn get(&self, namespace: &str, name: &str) -> Result<Secret, AccessorError> {
        let key = ObjectRef::new(name).within(namespace);
        self.store
            .get(&key)
            .map(|secret| (*secret).clone())
            .ok_or_else(|| AccessorError::not_found(namespace, name))
    }
}

#[async_trait]
impl SecretClient for KubeSecretAccessor {
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, AccessorError> {
        self.api(namespace)
            .get(name)
            .await
            .map_err(|e| AccessorError::from_kube(e, namespace, name))
    }

    async fn create(&self, secret: &Secret) -> Result<Secret, AccessorError> {
        let (namespace, name) = secret_key(secret);
        debug!("Creating Secret {}/{}", namespace, name);
        self.api(namespace)
            .create(&self.post_params(), secret)
            .await
            .map_err(|e| AccessorError::from_kube(e, namespace, name))
    }

    async fn update(&self, secret: &Secret) -> Result<Secret, AccessorError> {
        let (namespace, name) = secret_key(secret);
        debug!("Replacing Secret {}/{}", namespace, name);
        self.api(namespace)
            .replace(name, &self.post_params(), secret)
            .await
            .map_err(|e| AccessorError::from_kube(e, namespace, name))
    }
}

#[async_trait]
impl EventPublisher for KubeSecretAccessor {
    async fn publish(&self, owner: &Owner, event: &SecretEvent) -> Result<(), AccessorError> {
        let type_ = match event.type_ {
            SecretEventType::Normal => EventType::Normal,
            SecretEventType::Warning => EventType::Warning,
        };
        self.recorder
            .publish(
                &Event {
                    type_,
                    reason: event.reason.to_string(),
                    note: Some(event.note.clone()),
                    action: event.action.to_string(),
                    secondary: None,
                },
                &owner.object_reference(),
            )
            .await
            .map_err(AccessorError::Api)
    }
}

impl SecretAccessor for KubeSecretAccessor {
    fn secret_lister(&self) -> &dyn SecretLister {
        self
    }

    fn kube_client(&self) -> &dyn SecretClient {
        self
    }

    fn event_publisher(&self) -> Option<&dyn EventPublisher> {
        Some(self)
    }
}

fn secret_key(secret: &Secret) -> (&str, &str) {
    (
        secret.metadata.namespace.as_deref().unwrap_or_default(),
        secret.metadata.name.as_deref().unwrap_or_default(),
    )
}
