//! # Owner
//!
//! Identity of the primary resource a Secret is reconciled for, and the
//! OwnerReference helpers used to check and establish ownership.

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

/// The resource on whose behalf a Secret is managed
///
/// The namespace is optional: owned Secrets always live in the owner's
/// namespace, so it is only needed to address events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    pub namespace: Option<String>,
}

impl Owner {
    #[must_use]
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
            uid: uid.into(),
            namespace: None,
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Build an owner from any Kubernetes resource
    ///
    /// Returns `None` when the resource has no name or no UID yet (i.e. it has
    /// not been persisted by the API server).
    pub fn from_resource<K>(obj: &K) -> Option<Self>
    where
        K: Resource,
        K::DynamicType: Default,
    {
        let dt = K::DynamicType::default();
        let meta = obj.meta();
        Some(Self {
            api_version: K::api_version(&dt).into_owned(),
            kind: K::kind(&dt).into_owned(),
            name: meta.name.clone()?,
            uid: meta.uid.clone()?,
            namespace: obj.namespace(),
        })
    }

    /// Controller OwnerReference pointing back at this owner
    #[must_use]
    pub fn controller_owner_ref(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    /// Reference used as the `regarding` object of published events
    #[must_use]
    pub fn object_reference(&self) -> ObjectReference {
        ObjectReference {
            api_version: Some(self.api_version.clone()),
            kind: Some(self.kind.clone()),
            name: Some(self.name.clone()),
            namespace: self.namespace.clone(),
            uid: Some(self.uid.clone()),
            ..Default::default()
        }
    }

    /// Whether this owner is the controller of `meta`
    ///
    /// A plain (non-controller) reference with the owner's UID does not count.
    #[must_use]
    pub fn owns(&self, meta: &ObjectMeta) -> bool {
        is_controlled_by(meta, &self.uid)
    }
}

/// Linear scan of the OwnerReferences for `owner_uid`
#[must_use]
pub fn is_owned_by(meta: &ObjectMeta, owner_uid: &str) -> bool {
    meta.owner_references
        .iter()
        .flatten()
        .any(|owner| owner.uid == owner_uid)
}

/// Whether the controlling OwnerReference of `meta` has `owner_uid`
#[must_use]
pub fn is_controlled_by(meta: &ObjectMeta, owner_uid: &str) -> bool {
    controller_of(meta).is_some_and(|owner| owner.uid == owner_uid)
}

/// Returns the controlling OwnerReference, if any
#[must_use]
pub fn controller_of(meta: &ObjectMeta) -> Option<&OwnerReference> {
    meta.owner_references
        .iter()
        .flatten()
        .find(|owner| matches!(owner.controller, Some(true)))
}

/// Ensure `meta` carries a controller reference for `owner`
///
/// An existing reference with the owner's UID is upgraded to a controller
/// reference in place; otherwise a new one is appended.
pub fn ensure_controller_ref(meta: &mut ObjectMeta, owner: &Owner) {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    if let Some(existing) = refs.iter_mut().find(|r| r.uid == owner.uid) {
        existing.controller = Some(true);
        return;
    }
    refs.push(owner.controller_owner_ref());
}
