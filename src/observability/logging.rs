//! # Logging
//!
//! `tracing-subscriber` setup. `RUST_LOG` wins when set; otherwise the
//! configured level applies to this crate only.

use crate::config::ReconcilerConfig;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
#[must_use]
pub fn default_filter(config: &ReconcilerConfig) -> String {
    format!("secret_reconciler={}", config.log_level.to_lowercase())
}

/// Install the global tracing subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(config: &ReconcilerConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json_logs() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_lowercases_level() {
        let config = ReconcilerConfig {
            log_level: "DEBUG".to_string(),
            ..ReconcilerConfig::default()
        };
        assert_eq!(default_filter(&config), "secret_reconciler=debug");
    }
}
