//! # Runtime
//!
//! Process start-up for controllers embedding the Secret reconciler.

pub mod initialization;

pub use initialization::{initialize, install_crypto_provider};
