//! Secret Reconciler Library
//!
//! Keeps a Kubernetes Secret in agreement with a desired body on behalf of an
//! owning resource: creates it when missing, updates its payload when it
//! drifts, leaves it alone when it already matches, and refuses to touch a
//! Secret that another owner controls.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use secret_reconciler::prelude::*;
//!
//! # async fn run(desired: k8s_openapi::api::core::v1::Secret) -> anyhow::Result<()> {
//! let config = ReconcilerConfig::from_env();
//! let accessor = secret_reconciler::runtime::initialize(&config).await?;
//! let owner = Owner::new("v1", "Service", "ownerObj", "abcd").with_namespace("default");
//! let secret = reconcile_secret(&owner, &desired, &accessor).await?;
//! # let _ = secret;
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod config;
pub mod constants;
pub mod controller;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod testing;
