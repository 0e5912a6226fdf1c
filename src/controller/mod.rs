//! # Controller
//!
//! - `owner`: owner identity and OwnerReference helpers
//! - `reconciler`: Secret reconciliation

pub mod owner;
pub mod reconciler;
