//! # Testing
//!
//! In-memory harness for exercising the reconciler without a cluster.
//!
//! - [`FakeCluster`]: fake API server + lagging informer cache implementing [`SecretAccessor`](crate::accessor::SecretAccessor)
//! - [`wait_for_secret`]: poll the cache until a write becomes visible

mod fake_cluster;
mod wait;

pub use fake_cluster::FakeCluster;
pub use wait::{has_payload_and_owner, matches_desired, wait_for_secret, PollOptions, WaitError};
