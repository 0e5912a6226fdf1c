//! # Fake Cluster
//!
//! In-memory stand-in for the API server and the Secret informer.
//!
//! Writes land in an authoritative map immediately and reach the reflector
//! cache asynchronously through a channel, so reads after writes behave like
//! a real informer: eventually consistent. The authoritative map enforces the
//! same rules the API server does for Secrets: create fails with a conflict
//! when the name is taken, update fails with a conflict when the
//! `resourceVersion` is stale.

use crate::accessor::{
    AccessorError, EventPublisher, SecretAccessor, SecretClient, SecretEvent, SecretLister,
};
use crate::controller::owner::Owner;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube_runtime::reflector::{self, ObjectRef, Store};
use kube_runtime::watcher;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type Key = (String, String);

#[derive(Default)]
struct InjectedFailures {
    cached_read: Option<AccessorError>,
    create: Option<AccessorError>,
    update: Option<AccessorError>,
}

/// Fake API server plus informer cache for Secrets
///
/// Must be created inside a tokio runtime: cache propagation runs as a task.
pub struct FakeCluster {
    objects: Mutex<BTreeMap<Key, Secret>>,
    resource_version: AtomicU64,
    cache: Store<Secret>,
    cache_tx: mpsc::UnboundedSender<watcher::Event<Secret>>,
    propagation_task: JoinHandle<()>,
    cached_reads: AtomicUsize,
    authoritative_reads: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    failures: Mutex<InjectedFailures>,
    events: Mutex<Vec<(Owner, SecretEvent)>>,
    fail_events: AtomicBool,
}

impl fmt::Debug for FakeCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeCluster")
            .field("objects", &lock(&self.objects).len())
            .field("cached", &self.cache.state().len())
            .field("create_calls", &self.create_calls())
            .field("update_calls", &self.update_calls())
            .finish_non_exhaustive()
    }
}

impl FakeCluster {
    /// Cluster seeded with `secrets`, visible in both the store and the cache
    pub fn new(secrets: impl IntoIterator<Item = Secret>) -> Self {
        Self::with_propagation_delay(secrets, Duration::ZERO)
    }

    /// Same as [`FakeCluster::new`], delaying every cache update by `delay`
    pub fn with_propagation_delay(secrets: impl IntoIterator<Item = Secret>, delay: Duration) -> Self {
        let (cache, mut writer) = reflector::store::<Secret>();
        let mut objects = BTreeMap::new();
        let mut resource_version = 0;

        writer.apply_watcher_event(&watcher::Event::Init);
        for mut secret in secrets {
            resource_version += 1;
            stamp(&mut secret, resource_version);
            writer.apply_watcher_event(&watcher::Event::InitApply(secret.clone()));
            objects.insert(key_of(&secret), secret);
        }
        writer.apply_watcher_event(&watcher::Event::InitDone);

        let (cache_tx, mut cache_rx) = mpsc::unbounded_channel::<watcher::Event<Secret>>();
        let propagation_task = tokio::spawn(async move {
            while let Some(event) = cache_rx.recv().await {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                writer.apply_watcher_event(&event);
            }
        });

        Self {
            objects: Mutex::new(objects),
            resource_version: AtomicU64::new(resource_version),
            cache,
            cache_tx,
            propagation_task,
            cached_reads: AtomicUsize::new(0),
            authoritative_reads: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            failures: Mutex::new(InjectedFailures::default()),
            events: Mutex::new(Vec::new()),
            fail_events: AtomicBool::new(false),
        }
    }

    /// Store a Secret without telling the cache, as if another writer had
    /// created it and the informer had not caught up yet
    pub fn insert_uncached(&self, mut secret: Secret) -> Secret {
        stamp(&mut secret, self.next_resource_version());
        lock(&self.objects).insert(key_of(&secret), secret.clone());
        secret
    }

    /// Modify a stored Secret without telling the cache (concurrent writer)
    ///
    /// Returns `false` when no such Secret is stored.
    pub fn modify_uncached(&self, namespace: &str, name: &str, f: impl FnOnce(&mut Secret)) -> bool {
        let mut objects = lock(&self.objects);
        let Some(secret) = objects.get_mut(&(namespace.to_string(), name.to_string())) else {
            return false;
        };
        f(secret);
        secret.metadata.resource_version = Some(self.next_resource_version().to_string());
        true
    }

    /// Authoritative copy of a Secret, bypassing counters and the cache
    #[must_use]
    pub fn stored(&self, namespace: &str, name: &str) -> Option<Secret> {
        lock(&self.objects)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn cache(&self) -> &Store<Secret> {
        &self.cache
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Create plus update calls
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.create_calls() + self.update_calls()
    }

    #[must_use]
    pub fn cached_reads(&self) -> usize {
        self.cached_reads.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn authoritative_reads(&self) -> usize {
        self.authoritative_reads.load(Ordering::SeqCst)
    }

    /// Events published so far, in order
    #[must_use]
    pub fn events(&self) -> Vec<SecretEvent> {
        lock(&self.events).iter().map(|(_, e)| e.clone()).collect()
    }

    /// Owners the events were published on, in order
    #[must_use]
    pub fn event_owners(&self) -> Vec<Owner> {
        lock(&self.events).iter().map(|(o, _)| o.clone()).collect()
    }

    /// Make the next cached read fail with `error`
    pub fn fail_next_cached_read(&self, error: AccessorError) {
        lock(&self.failures).cached_read = Some(error);
    }

    /// Make the next create call fail with `error` (the call is still counted)
    pub fn fail_next_create(&self, error: AccessorError) {
        lock(&self.failures).create = Some(error);
    }

    /// Make the next update call fail with `error` (the call is still counted)
    pub fn fail_next_update(&self, error: AccessorError) {
        lock(&self.failures).update = Some(error);
    }

    /// Make every event publication fail
    pub fn fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    fn next_resource_version(&self) -> u64 {
        self.resource_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn propagate(&self, secret: &Secret) {
        // The receiver only goes away when the cluster is dropped
        let _ = self.cache_tx.send(watcher::Event::Apply(secret.clone()));
    }
}

impl Drop for FakeCluster {
    fn drop(&mut self) {
        self.propagation_task.abort();
    }
}

impl SecretLister for FakeCluster {
    fn get(&self, namespace: &str, name: &str) -> Result<Secret, AccessorError> {
        self.cached_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.failures).cached_read.take() {
            return Err(error);
        }
        self.cache
            .get(&ObjectRef::new(name).within(namespace))
            .map(|secret| (*secret).clone())
            .ok_or_else(|| AccessorError::not_found(namespace, name))
    }
}

#[async_trait]
impl SecretClient for FakeCluster {
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, AccessorError> {
        self.authoritative_reads.fetch_add(1, Ordering::SeqCst);
        self.stored(namespace, name)
            .ok_or_else(|| AccessorError::not_found(namespace, name))
    }

    async fn create(&self, secret: &Secret) -> Result<Secret, AccessorError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.failures).create.take() {
            return Err(error);
        }
        let key = key_of(secret);
        validate_owner_references(secret, &key)?;
        let mut objects = lock(&self.objects);
        if objects.contains_key(&key) {
            return Err(AccessorError::conflict(
                &key.0,
                &key.1,
                format!("secrets {:?} already exists", key.1),
            ));
        }
        let mut created = secret.clone();
        stamp(&mut created, self.next_resource_version());
        objects.insert(key, created.clone());
        // Send while still holding the lock so cache events stay in resourceVersion order
        self.propagate(&created);
        drop(objects);
        Ok(created)
    }

    async fn update(&self, secret: &Secret) -> Result<Secret, AccessorError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.failures).update.take() {
            return Err(error);
        }
        let key = key_of(secret);
        validate_owner_references(secret, &key)?;
        let mut objects = lock(&self.objects);
        let Some(current) = objects.get(&key) else {
            return Err(AccessorError::not_found(&key.0, &key.1));
        };
        if secret.metadata.resource_version.is_some()
            && secret.metadata.resource_version != current.metadata.resource_version
        {
            return Err(AccessorError::conflict(
                &key.0,
                &key.1,
                "the object has been modified; please apply your changes to the latest version and try again",
            ));
        }
        let mut updated = secret.clone();
        updated.metadata.uid.clone_from(&current.metadata.uid);
        updated.metadata.resource_version = Some(self.next_resource_version().to_string());
        objects.insert(key, updated.clone());
        self.propagate(&updated);
        drop(objects);
        Ok(updated)
    }
}

#[async_trait]
impl EventPublisher for FakeCluster {
    async fn publish(&self, owner: &Owner, event: &SecretEvent) -> Result<(), AccessorError> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(AccessorError::Other("event sink unavailable".to_string()));
        }
        lock(&self.events).push((owner.clone(), event.clone()));
        Ok(())
    }
}

impl SecretAccessor for FakeCluster {
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

fn key_of(secret: &Secret) -> Key {
    (
        secret.metadata.namespace.clone().unwrap_or_default(),
        secret.metadata.name.clone().unwrap_or_default(),
    )
}

/// Reject what API server validation rejects: more than one controller reference
fn validate_owner_references(secret: &Secret, key: &Key) -> Result<(), AccessorError> {
    let controllers = secret
        .metadata
        .owner_references
        .iter()
        .flatten()
        .filter(|owner| owner.controller == Some(true))
        .count();
    if controllers > 1 {
        return Err(AccessorError::Other(format!(
            "Secret {}/{} is invalid: metadata.ownerReferences: Invalid value: \
             only one reference can have Controller set to true, found {controllers}",
            key.0, key.1
        )));
    }
    Ok(())
}

/// Fill in the fields the API server assigns on create
fn stamp(secret: &mut Secret, resource_version: u64) {
    secret.metadata.resource_version = Some(resource_version.to_string());
    if secret.metadata.uid.is_none() {
        secret.metadata.uid = Some(format!("secret-uid-{resource_version}"));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn secret(name: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_seeded_secrets_are_cached() {
        let cluster = FakeCluster::new([secret("a")]);
        let cached = SecretLister::get(&cluster, "default", "a").unwrap();
        assert_eq!(cached.metadata.resource_version.as_deref(), Some("1"));
        assert_eq!(cluster.cached_reads(), 1);
    }

    #[tokio::test]
    async fn test_create_conflicts_on_existing_name() {
        let cluster = FakeCluster::new([secret("a")]);
        let err = cluster.create(&secret("a")).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(cluster.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_stale_resource_version() {
        let cluster = FakeCluster::new([secret("a")]);
        let stale = SecretLister::get(&cluster, "default", "a").unwrap();
        assert!(cluster.modify_uncached("default", "a", |_| {}));

        let err = cluster.update(&stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let cluster = FakeCluster::new([]);
        let err = cluster.update(&secret("missing")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_insert_uncached_is_invisible_to_lister() {
        let cluster = FakeCluster::new([]);
        cluster.insert_uncached(secret("a"));
        assert!(SecretLister::get(&cluster, "default", "a")
            .unwrap_err()
            .is_not_found());
        assert!(SecretClient::get(&cluster, "default", "a").await.is_ok());
        assert_eq!(cluster.authoritative_reads(), 1);
    }

    #[tokio::test]
    async fn test_rejects_two_controller_references() {
        let cluster = FakeCluster::new([secret("a")]);
        let mut body = secret("b");
        body.metadata.owner_references = Some(vec![
            Owner::new("v1", "Service", "first", "1234").controller_owner_ref(),
            Owner::new("v1", "Service", "second", "5678").controller_owner_ref(),
        ]);
        let err = cluster.create(&body).await.unwrap_err();
        assert!(err.to_string().contains("only one reference can have Controller"));
        assert!(cluster.stored("default", "b").is_none());

        let mut existing = cluster.stored("default", "a").unwrap();
        existing.metadata.owner_references = body.metadata.owner_references.clone();
        assert!(cluster.update(&existing).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cache_ends_on_latest_version_with_concurrent_writers() {
        let cluster = std::sync::Arc::new(FakeCluster::new([secret("a")]));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let cluster = std::sync::Arc::clone(&cluster);
                tokio::spawn(async move {
                    // No resourceVersion: last write wins
                    cluster.update(&secret("a")).await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let latest = cluster.stored("default", "a").unwrap().metadata.resource_version;
        assert_eq!(latest.as_deref(), Some("33"));
        let seen = crate::testing::wait_for_secret(
            cluster.as_ref(),
            "default",
            "a",
            crate::testing::PollOptions::default(),
            |s| s.metadata.resource_version == latest,
        )
        .await;
        assert!(seen.is_ok(), "cache did not converge: {seen:?}");
    }

    #[tokio::test]
    async fn test_injected_failures_fire_once() {
        let cluster = FakeCluster::new([]);
        cluster.fail_next_create(AccessorError::Other("boom".to_string()));
        assert!(cluster.create(&secret("a")).await.is_err());
        assert!(cluster.create(&secret("a")).await.is_ok());
        assert_eq!(cluster.create_calls(), 2);
    }
}
