//! # Initialization
//!
//! rustls setup, tracing, metrics registration, Kubernetes client creation
//! and Secret cache start-up.

use crate::accessor::KubeSecretAccessor;
use crate::config::ReconcilerConfig;
use crate::observability;
use anyhow::{Context, Result};
use kube::Client;
use tracing::{info, warn};

/// Install `ring` as the process-wide rustls crypto provider
///
/// Required for rustls 0.23+ when no default provider is selected via
/// features. Safe to call more than once.
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        // Another provider (ours or the embedding binary's) is already installed
        tracing::debug!("rustls crypto provider already installed");
    }
}

/// Bring up everything the reconciler needs and return a ready accessor
///
/// Must be called from within a tokio runtime; the Secret watch is spawned on it.
pub async fn initialize(config: &ReconcilerConfig) -> Result<KubeSecretAccessor> {
    install_crypto_provider();

    if let Err(e) = observability::logging::init_tracing(config) {
        // Embedding binaries often install their own subscriber first
        warn!("{e:#}");
    }

    if config.enable_metrics {
        observability::metrics::register_metrics().context("Failed to register metrics")?;
    }

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!(
        "Starting Secret cache (namespace: {})",
        config.watch_namespace.as_deref().unwrap_or("all")
    );

    let accessor = KubeSecretAccessor::start(client, config);
    accessor
        .wait_until_ready(config.cache_sync_timeout())
        .await?;
    Ok(accessor)
}
