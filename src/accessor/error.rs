//! # Accessor Errors
//!
//! Classified errors returned by the Secret read/write capabilities.
//!
//! The reconciler branches on [`AccessorError::NotFound`] (create path) and
//! [`AccessorError::Conflict`] (create race). Everything else is opaque and is
//! propagated to the caller unchanged.

use thiserror::Error;

/// Errors returned by [`SecretLister`](super::SecretLister),
/// [`SecretClient`](super::SecretClient) and [`EventPublisher`](super::EventPublisher)
#[derive(Debug, Error)]
pub enum AccessorError {
    /// The Secret does not exist (HTTP 404 or absent from the cache)
    #[error("Secret {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    /// The write was rejected because the Secret already exists or changed
    /// since it was read (HTTP 409)
    #[error("conflict writing Secret {namespace}/{name}: {message}")]
    Conflict {
        namespace: String,
        name: String,
        message: String,
    },

    /// Any other Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[source] kube::Error),

    /// Failures that do not come from the API server (cache not ready, injected test failures)
    #[error("{0}")]
    Other(String),
}

impl AccessorError {
    /// Classify a `kube::Error` for the Secret at `namespace/name`
    ///
    /// 404 becomes [`AccessorError::NotFound`], 409 becomes [`AccessorError::Conflict`],
    /// everything else is wrapped in [`AccessorError::Api`].
    #[must_use]
    pub fn from_kube(error: kube::Error, namespace: &str, name: &str) -> Self {
        match error {
            kube::Error::Api(ae) if ae.code == 404 => AccessorError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(ae) if ae.code == 409 => AccessorError::Conflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: ae.message,
            },
            other => AccessorError::Api(other),
        }
    }

    /// Shorthand used by listers and fakes
    #[must_use]
    pub fn not_found(namespace: &str, name: &str) -> Self {
        AccessorError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn conflict(namespace: &str, name: &str, message: impl Into<String>) -> Self {
        AccessorError::Conflict {
            namespace: namespace.to_string(),
            name: name.to_string(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessorError::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, AccessorError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_classify() {
        let not_found = AccessorError::not_found("default", "secret");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_conflict());
        assert_eq!(not_found.to_string(), "Secret default/secret not found");

        let conflict = AccessorError::conflict("default", "secret", "already exists");
        assert!(conflict.is_conflict());
        assert!(!conflict.is_not_found());
        assert_eq!(
            conflict.to_string(),
            "conflict writing Secret default/secret: already exists"
        );
    }

    fn api_error(code: u16, message: &str) -> kube::Error {
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: "Test".to_string(),
            code,
        })
    }

    #[test]
    fn test_from_kube_classifies_status_codes() {
        let not_found = AccessorError::from_kube(api_error(404, "missing"), "default", "secret");
        assert!(not_found.is_not_found());

        let conflict = AccessorError::from_kube(
            api_error(409, "secrets \"secret\" already exists"),
            "default",
            "secret",
        );
        assert!(matches!(
            conflict,
            AccessorError::Conflict { ref message, .. } if message == "secrets \"secret\" already exists"
        ));

        let forbidden = AccessorError::from_kube(api_error(403, "forbidden"), "default", "secret");
        assert!(matches!(forbidden, AccessorError::Api(_)));
    }

    #[test]
    fn test_other_is_neither() {
        let other = AccessorError::Other("cache not synced".to_string());
        assert!(!other.is_not_found());
        assert!(!other.is_conflict());
        assert_eq!(other.to_string(), "cache not synced");
    }
}
