//! # Metrics
//!
//! Prometheus metrics for monitoring Secret reconciliation.
//!
//! ## Metrics Exposed
//!
//! - `secret_reconciler_reconciliations_total{outcome}` - Successful reconciliations by outcome (created, updated, unchanged)
//! - `secret_reconciler_reconciliation_errors_total{reason}` - Failed reconciliations by reason
//! - `secret_reconciler_reconciliation_duration_seconds` - Duration of reconciliation calls
//! - `secret_reconciler_create_conflicts_total` - Creates that lost a race against a concurrent creator

use anyhow::Result;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_reconciler_reconciliations_total",
            "Total number of successful Secret reconciliations by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_reconciler_reconciliation_errors_total",
            "Total number of failed Secret reconciliations by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "secret_reconciler_reconciliation_duration_seconds",
            "Duration of Secret reconciliation in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static CREATE_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_reconciler_create_conflicts_total",
        "Total number of Secret creates that lost a race against a concurrent creator",
    )
    .expect("Failed to create CREATE_CONFLICTS_TOTAL metric - this should never happen")
});

/// Register all metrics with the crate registry
///
/// Must be called at most once per process.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(CREATE_CONFLICTS_TOTAL.clone()))?;
    Ok(())
}

/// Render the registry in the Prometheus text exposition format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_reconciliations(outcome: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_create_conflicts() {
    CREATE_CONFLICTS_TOTAL.inc();
}

/// Current value of the reconciliation counter for `outcome`
#[must_use]
pub fn reconciliations(outcome: &str) -> u64 {
    RECONCILIATIONS_TOTAL.with_label_values(&[outcome]).get()
}

/// Current value of the error counter for `reason`
#[must_use]
pub fn reconciliation_errors(reason: &str) -> u64 {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).get()
}
