//! # Constants
//!
//! Shared constants used throughout the reconciler.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default field manager recorded on Secrets written by the reconciler
pub const DEFAULT_FIELD_MANAGER: &str = "secret-reconciler";

/// Default reporting controller name attached to Kubernetes Events
pub const DEFAULT_EVENT_REPORTER: &str = "secret-reconciler";

/// Default time to wait for the Secret cache to complete its initial list (seconds)
pub const DEFAULT_CACHE_SYNC_TIMEOUT_SECS: u64 = 30;

/// Default interval between cache polls when waiting for a write to propagate (milliseconds)
pub const DEFAULT_CACHE_POLL_INTERVAL_MS: u64 = 10;

/// Default upper bound for a write to become visible in the cache (seconds)
pub const DEFAULT_CACHE_PROPAGATION_TIMEOUT_SECS: u64 = 3;

/// Default log filter level when `RUST_LOG` is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log output format (`text` or `json`)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Event reasons published on the owning resource
pub const EVENT_REASON_CREATED: &str = "Created";
pub const EVENT_REASON_CREATION_FAILED: &str = "CreationFailed";
pub const EVENT_REASON_UPDATED: &str = "Updated";
pub const EVENT_REASON_UPDATE_FAILED: &str = "UpdateFailed";

/// Event action recorded alongside every Secret event
pub const EVENT_ACTION_RECONCILE_SECRET: &str = "ReconcileSecret";
