//! Common fixtures for reconciler integration tests
//!
//! An owner Service `default/ownerObj` (UID `abcd`) and three Secrets named
//! `default/secret`: `origin` (owned), `desired` (owned, new payload) and
//! `not_owned_secret` (no OwnerReferences).

#![allow(dead_code, reason = "each test binary uses a different subset of fixtures")]

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use secret_reconciler::controller::owner::Owner;
use secret_reconciler::testing::PollOptions;
use std::collections::BTreeMap;
use std::time::Duration;

pub const NAMESPACE: &str = "default";
pub const SECRET_NAME: &str = "secret";
pub const SECRET_KEY: &str = "test-secret";

pub fn owner_obj() -> Owner {
    Owner::new("v1", "Service", "ownerObj", "abcd").with_namespace(NAMESPACE)
}

pub fn owner_ref() -> OwnerReference {
    owner_obj().controller_owner_ref()
}

pub fn payload(value: &str) -> BTreeMap<String, ByteString> {
    BTreeMap::from([(SECRET_KEY.to_string(), ByteString(value.as_bytes().to_vec()))])
}

pub fn secret_with(value: &str, owner_references: Option<Vec<OwnerReference>>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(SECRET_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            owner_references,
            ..Default::default()
        },
        data: Some(payload(value)),
        ..Default::default()
    }
}

pub fn origin() -> Secret {
    secret_with("origin", Some(vec![owner_ref()]))
}

pub fn desired() -> Secret {
    secret_with("desired", Some(vec![owner_ref()]))
}

pub fn not_owned_secret() -> Secret {
    secret_with("origin", None)
}

/// 10ms interval, 3s bound
pub fn poll() -> PollOptions {
    PollOptions {
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(3),
    }
}
