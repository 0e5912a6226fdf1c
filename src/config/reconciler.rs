//! # Reconciler Configuration
//!
//! Process-level settings for the Secret reconciler and its Kubernetes accessor.

use std::time::Duration;

/// Reconciler configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are usually populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    /// Used when `RUST_LOG` is not set
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Enable metrics collection
    pub enable_metrics: bool,
    /// Field manager name sent with create and replace requests
    pub field_manager: String,
    /// Reporting controller name on published Kubernetes Events
    pub event_reporter: String,
    /// Reporting instance (pod name) on published Kubernetes Events
    pub pod_name: Option<String>,
    /// Restrict the Secret cache to one namespace; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// How long to wait for the Secret cache to finish its initial list (seconds)
    pub cache_sync_timeout_secs: u64,
    /// Poll interval used when waiting for a write to show up in the cache (milliseconds)
    pub cache_poll_interval_ms: u64,
    /// Upper bound for a write to show up in the cache (seconds)
    pub cache_propagation_timeout_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            enable_metrics: true,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            event_reporter: DEFAULT_EVENT_REPORTER.to_string(),
            pod_name: None,
            watch_namespace: None,
            cache_sync_timeout_secs: DEFAULT_CACHE_SYNC_TIMEOUT_SECS,
            cache_poll_interval_ms: DEFAULT_CACHE_POLL_INTERVAL_MS,
            cache_propagation_timeout_secs: DEFAULT_CACHE_PROPAGATION_TIMEOUT_SECS,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            log_level: env_var_or_default_str("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            log_format: env_var_or_default_str("LOG_FORMAT", DEFAULT_LOG_FORMAT),
            enable_metrics: env_var_or_default_bool("ENABLE_METRICS", true),
            field_manager: env_var_or_default_str("FIELD_MANAGER", DEFAULT_FIELD_MANAGER),
            event_reporter: env_var_or_default_str("EVENT_REPORTER", DEFAULT_EVENT_REPORTER),
            pod_name: env_var_non_empty("POD_NAME"),
            watch_namespace: env_var_non_empty("WATCH_NAMESPACE"),
            cache_sync_timeout_secs: env_var_or_default(
                "CACHE_SYNC_TIMEOUT_SECS",
                DEFAULT_CACHE_SYNC_TIMEOUT_SECS,
            ),
            cache_poll_interval_ms: env_var_or_default(
                "CACHE_POLL_INTERVAL_MS",
                DEFAULT_CACHE_POLL_INTERVAL_MS,
            ),
            cache_propagation_timeout_secs: env_var_or_default(
                "CACHE_PROPAGATION_TIMEOUT_SECS",
                DEFAULT_CACHE_PROPAGATION_TIMEOUT_SECS,
            ),
        }
    }

    /// Get cache sync timeout duration
    #[must_use]
    pub fn cache_sync_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_sync_timeout_secs)
    }

    /// Get cache poll interval duration
    #[must_use]
    pub fn cache_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cache_poll_interval_ms)
    }

    /// Get cache propagation timeout duration
    #[must_use]
    pub fn cache_propagation_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_propagation_timeout_secs)
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
