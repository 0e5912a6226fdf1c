//! # Payload
//!
//! Normalisation and comparison of Secret payloads.
//!
//! The API server folds `stringData` into `data` on write and never returns
//! `stringData`, so the desired payload is normalised the same way before it
//! is compared or written. A missing map and an empty map are equal.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

pub type Payload = BTreeMap<String, ByteString>;

/// Desired payload as the API server would store it
///
/// `stringData` entries win over `data` entries with the same key.
#[must_use]
pub fn desired_payload(desired: &Secret) -> Option<Payload> {
    let Some(string_data) = desired.string_data.as_ref().filter(|m| !m.is_empty()) else {
        return desired.data.clone();
    };
    let mut data = desired.data.clone().unwrap_or_default();
    for (key, value) in string_data {
        data.insert(key.clone(), ByteString(value.clone().into_bytes()));
    }
    Some(data)
}

/// Structural equality where `None` and an empty map are the same payload
#[must_use]
pub fn payload_equal(observed: Option<&Payload>, desired: Option<&Payload>) -> bool {
    match (observed, desired) {
        (Some(a), Some(b)) => a == b,
        (Some(m), None) | (None, Some(m)) => m.is_empty(),
        (None, None) => true,
    }
}
