//! # Stores
//!
//! Seams between the reconcilers and the cluster.
//!
//! Reconcilers only read and write through [`ResourceStore`] and [`SecretStore`];
//! [`KubeStore`] implements both against the Kubernetes API. Objects are fetched
//! fresh on every reconciliation and never cached here.

mod kubernetes;

pub use kubernetes::KubeStore;

use crate::constants::{CLUSTER_ORIGIN_ISSUER_KIND, ISSUER_GROUP, ORIGIN_ISSUER_KIND};
use crate::crd::{
    CertificateRequest, ClusterOriginIssuer, OriginIssuer, OriginIssuerSpec, OriginIssuerStatus,
};
use async_trait::async_trait;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Secret contents keyed by data key
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Identifies an object by namespace and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Key of an object read from the API
    #[must_use]
    pub fn from_resource<K: Resource>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace(),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Scope of an issuer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssuerKind {
    /// `OriginIssuer`, secrets resolved in its own namespace
    Namespaced,
    /// `ClusterOriginIssuer`, secrets resolved in the cluster resource namespace
    Cluster,
}

impl IssuerKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuerKind::Namespaced => ORIGIN_ISSUER_KIND,
            IssuerKind::Cluster => CLUSTER_ORIGIN_ISSUER_KIND,
        }
    }
}

impl fmt::Display for IssuerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an issuer of either scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssuerRef {
    pub kind: IssuerKind,
    pub name: String,
    /// Namespace of a namespaced issuer; `None` for cluster issuers
    pub namespace: Option<String>,
}

impl IssuerRef {
    #[must_use]
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: IssuerKind::Namespaced,
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    #[must_use]
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            kind: IssuerKind::Cluster,
            name: name.into(),
            namespace: None,
        }
    }

    /// Namespace holding this issuer's credential secret
    #[must_use]
    pub fn effective_namespace<'a>(&'a self, cluster_resource_namespace: &'a str) -> &'a str {
        match self.kind {
            IssuerKind::Namespaced => self.namespace.as_deref().unwrap_or_default(),
            IssuerKind::Cluster => cluster_resource_namespace,
        }
    }

    /// Issuer referenced by a CertificateRequest, or `None` when the request
    /// targets an issuer this controller does not own.
    ///
    /// An empty group is accepted, an empty kind means `OriginIssuer`.
    #[must_use]
    pub fn for_certificate_request(request: &CertificateRequest) -> Option<Self> {
        let issuer_ref = &request.spec.issuer_ref;

        if let Some(group) = issuer_ref.group.as_deref() {
            if !group.is_empty() && group != ISSUER_GROUP {
                return None;
            }
        }

        match issuer_ref.kind.as_deref().unwrap_or_default() {
            "" | ORIGIN_ISSUER_KIND => Some(Self::namespaced(
                request.namespace().unwrap_or_default(),
                issuer_ref.name.clone(),
            )),
            CLUSTER_ORIGIN_ISSUER_KIND => Some(Self::cluster(issuer_ref.name.clone())),
            _ => None,
        }
    }

    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for IssuerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.key())
    }
}

/// An issuer of either scope
#[derive(Debug, Clone, PartialEq)]
pub enum AnyIssuer {
    Namespaced(OriginIssuer),
    Cluster(ClusterOriginIssuer),
}

impl AnyIssuer {
    #[must_use]
    pub fn spec(&self) -> &OriginIssuerSpec {
        match self {
            AnyIssuer::Namespaced(issuer) => &issuer.spec,
            AnyIssuer::Cluster(issuer) => &issuer.spec.issuer,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<&OriginIssuerStatus> {
        match self {
            AnyIssuer::Namespaced(issuer) => issuer.status.as_ref(),
            AnyIssuer::Cluster(issuer) => issuer.status.as_ref(),
        }
    }

    /// Status, created empty when the issuer has none yet
    pub fn status_mut(&mut self) -> &mut OriginIssuerStatus {
        match self {
            AnyIssuer::Namespaced(issuer) => issuer.status.get_or_insert_with(Default::default),
            AnyIssuer::Cluster(issuer) => issuer.status.get_or_insert_with(Default::default),
        }
    }

    #[must_use]
    pub fn reference(&self) -> IssuerRef {
        match self {
            AnyIssuer::Namespaced(issuer) => {
                IssuerRef::namespaced(issuer.namespace().unwrap_or_default(), issuer.name_any())
            }
            AnyIssuer::Cluster(issuer) => IssuerRef::cluster(issuer.name_any()),
        }
    }
}

/// Store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: ObjectKey },

    /// Optimistic concurrency failure: the object changed since it was read
    #[error("conflict writing {kind} {key}: the object has been modified")]
    Conflict { kind: &'static str, key: ObjectKey },

    #[error("store request failed: {0}")]
    Api(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Typed access to issuers and certificate requests
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_issuer(&self, issuer: &IssuerRef) -> Result<AnyIssuer, StoreError>;

    /// Persist the issuer's status. Fails with [`StoreError::Conflict`] when the
    /// issuer changed since it was read.
    async fn update_issuer_status(&self, issuer: &AnyIssuer) -> Result<(), StoreError>;

    async fn get_certificate_request(&self, key: &ObjectKey) -> Result<CertificateRequest, StoreError>;

    /// Persist the request's status (conditions, certificate, failure time)
    async fn update_certificate_request_status(&self, request: &CertificateRequest) -> Result<(), StoreError>;
}

/// Read access to secrets
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Data of a secret, or `None` when the secret does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{CertificateRequestSpec, ObjectReference};
    use kube::api::ObjectMeta;

    fn request(kind: Option<&str>, group: Option<&str>) -> CertificateRequest {
        CertificateRequest {
            metadata: ObjectMeta {
                name: Some("foobar".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: CertificateRequestSpec {
                issuer_ref: ObjectReference {
                    name: "issuer".to_string(),
                    kind: kind.map(str::to_string),
                    group: group.map(str::to_string),
                },
                ..Default::default()
            },
            status: None,
        }
    }

    #[test]
    fn test_issuer_ref_defaults_to_namespaced_kind() {
        let issuer = IssuerRef::for_certificate_request(&request(None, Some(ISSUER_GROUP))).unwrap();
        assert_eq!(issuer, IssuerRef::namespaced("default", "issuer"));
    }

    #[test]
    fn test_issuer_ref_cluster_kind() {
        let issuer =
            IssuerRef::for_certificate_request(&request(Some("ClusterOriginIssuer"), Some(ISSUER_GROUP)))
                .unwrap();
        assert_eq!(issuer, IssuerRef::cluster("issuer"));
    }

    #[test]
    fn test_foreign_issuers_are_ignored() {
        assert!(IssuerRef::for_certificate_request(&request(Some("Issuer"), Some("cert-manager.io"))).is_none());
        assert!(IssuerRef::for_certificate_request(&request(Some("Issuer"), Some(ISSUER_GROUP))).is_none());
        assert!(IssuerRef::for_certificate_request(&request(Some("OriginIssuer"), Some(""))).is_some());
    }

    #[test]
    fn test_effective_namespace() {
        let namespaced = IssuerRef::namespaced("default", "issuer");
        let cluster = IssuerRef::cluster("issuer");

        assert_eq!(namespaced.effective_namespace("super-secret"), "default");
        assert_eq!(cluster.effective_namespace("super-secret"), "super-secret");
    }

    #[test]
    fn test_issuer_status_changes_are_detected() {
        let mut issuer = OriginIssuer::new("foobar", OriginIssuerSpec::default());
        issuer.metadata.namespace = Some("default".to_string());
        let before = AnyIssuer::Namespaced(issuer.clone());
        let mut after = AnyIssuer::Namespaced(issuer);
        assert_eq!(before, after);

        after.status_mut();
        assert_ne!(before, after);
        assert_eq!(after.reference(), IssuerRef::namespaced("default", "foobar"));

        let cluster = ClusterOriginIssuer::new("foobar", OriginIssuerSpec::default().into());
        assert_ne!(before, AnyIssuer::Cluster(cluster.clone()));
        assert_eq!(AnyIssuer::Cluster(cluster).reference(), IssuerRef::cluster("foobar"));
    }

    #[test]
    fn test_display() {
        assert_eq!(IssuerRef::namespaced("default", "foo").to_string(), "OriginIssuer default/foo");
        assert_eq!(IssuerRef::cluster("foo").to_string(), "ClusterOriginIssuer foo");
    }
}
