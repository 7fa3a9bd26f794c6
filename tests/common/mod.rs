//! Common test utilities
//!
//! Provides rustls setup for the pact mock servers, in-memory stores and
//! builders for the resources the reconcilers read.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use kube::api::ObjectMeta;
use origin_ca_issuer::controller::conditions::Clock;
use origin_ca_issuer::controller::store::{
    AnyIssuer, IssuerKind, IssuerRef, ObjectKey, ResourceStore, SecretData, SecretStore, StoreError,
};
use origin_ca_issuer::crd::{
    CertificateRequest, CertificateRequestSpec, CertificateRequestStatus, ClusterOriginIssuer,
    Condition, ConditionStatus, ObjectReference, OriginIssuer, OriginIssuerAuthentication,
    OriginIssuerSpec, OriginIssuerStatus, SecretKeySelector, CONDITION_READY,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

pub const ISSUER_GROUP: &str = "cert-manager.k8s.cloudflare.com";
pub const RAY_ID: &str = "0123456789abcdef-ABC";
pub const CSR_PEM: &str = include_str!("../fixtures/csr.pem");
pub const CERTIFICATE_PEM: &str = include_str!("../fixtures/certificate.pem");

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` so it only runs once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Clock frozen at a known instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// In-memory resource and secret store
#[derive(Debug, Default)]
pub struct MemoryStore {
    origin_issuers: Mutex<BTreeMap<(String, String), OriginIssuer>>,
    cluster_issuers: Mutex<BTreeMap<String, ClusterOriginIssuer>>,
    requests: Mutex<BTreeMap<(String, String), CertificateRequest>>,
    secrets: Mutex<BTreeMap<(String, String), SecretData>>,
    status_writes: AtomicUsize,
    conflict_on_write: AtomicBool,
}

impl MemoryStore {
    pub fn with_origin_issuer(self, issuer: OriginIssuer) -> Self {
        let key = (
            issuer.metadata.namespace.clone().unwrap_or_default(),
            issuer.metadata.name.clone().unwrap_or_default(),
        );
        self.origin_issuers.lock().unwrap().insert(key, issuer);
        self
    }

    pub fn with_cluster_issuer(self, issuer: ClusterOriginIssuer) -> Self {
        let key = issuer.metadata.name.clone().unwrap_or_default();
        self.cluster_issuers.lock().unwrap().insert(key, issuer);
        self
    }

    pub fn with_request(self, request: CertificateRequest) -> Self {
        let key = (
            request.metadata.namespace.clone().unwrap_or_default(),
            request.metadata.name.clone().unwrap_or_default(),
        );
        self.requests.lock().unwrap().insert(key, request);
        self
    }

    pub fn with_secret(self, namespace: &str, name: &str, key: &str, value: &str) -> Self {
        self.secrets
            .lock()
            .unwrap()
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.as_bytes().to_vec());
        self
    }

    /// Make every status write fail with a conflict
    pub fn conflict_on_write(self) -> Self {
        self.conflict_on_write.store(true, Ordering::SeqCst);
        self
    }

    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    pub fn origin_issuer(&self, namespace: &str, name: &str) -> OriginIssuer {
        self.origin_issuers.lock().unwrap()[&(namespace.to_string(), name.to_string())].clone()
    }

    pub fn cluster_issuer(&self, name: &str) -> ClusterOriginIssuer {
        self.cluster_issuers.lock().unwrap()[name].clone()
    }

    pub fn request(&self, namespace: &str, name: &str) -> CertificateRequest {
        self.requests.lock().unwrap()[&(namespace.to_string(), name.to_string())].clone()
    }

    fn check_write(&self, kind: &'static str, key: ObjectKey) -> Result<(), StoreError> {
        if self.conflict_on_write.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict { kind, key });
        }
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_issuer(&self, issuer: &IssuerRef) -> Result<AnyIssuer, StoreError> {
        let not_found = || StoreError::NotFound {
            kind: issuer.kind.as_str(),
            key: issuer.key(),
        };
        match issuer.kind {
            IssuerKind::Namespaced => self
                .origin_issuers
                .lock()
                .unwrap()
                .get(&(issuer.namespace.clone().unwrap_or_default(), issuer.name.clone()))
                .cloned()
                .map(AnyIssuer::Namespaced)
                .ok_or_else(not_found),
            IssuerKind::Cluster => self
                .cluster_issuers
                .lock()
                .unwrap()
                .get(&issuer.name)
                .cloned()
                .map(AnyIssuer::Cluster)
                .ok_or_else(not_found),
        }
    }

    async fn update_issuer_status(&self, issuer: &AnyIssuer) -> Result<(), StoreError> {
        let reference = issuer.reference();
        self.check_write(reference.kind.as_str(), reference.key())?;
        match issuer {
            AnyIssuer::Namespaced(issuer) => {
                let key = (
                    issuer.metadata.namespace.clone().unwrap_or_default(),
                    issuer.metadata.name.clone().unwrap_or_default(),
                );
                if let Some(stored) = self.origin_issuers.lock().unwrap().get_mut(&key) {
                    stored.status.clone_from(&issuer.status);
                }
            }
            AnyIssuer::Cluster(issuer) => {
                let key = issuer.metadata.name.clone().unwrap_or_default();
                if let Some(stored) = self.cluster_issuers.lock().unwrap().get_mut(&key) {
                    stored.status.clone_from(&issuer.status);
                }
            }
        }
        Ok(())
    }

    async fn get_certificate_request(&self, key: &ObjectKey) -> Result<CertificateRequest, StoreError> {
        self.requests
            .lock()
            .unwrap()
            .get(&(key.namespace.clone().unwrap_or_default(), key.name.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "CertificateRequest",
                key: key.clone(),
            })
    }

    async fn update_certificate_request_status(&self, request: &CertificateRequest) -> Result<(), StoreError> {
        let key = ObjectKey::from_resource(request);
        self.check_write("CertificateRequest", key.clone())?;
        if let Some(stored) = self
            .requests
            .lock()
            .unwrap()
            .get_mut(&(key.namespace.unwrap_or_default(), key.name))
        {
            stored.status.clone_from(&request.status);
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, StoreError> {
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

pub fn selector(name: &str, key: &str) -> SecretKeySelector {
    SecretKeySelector {
        name: name.to_string(),
        key: key.to_string(),
    }
}

pub fn service_key_auth(name: &str, key: &str) -> OriginIssuerAuthentication {
    OriginIssuerAuthentication {
        service_key_ref: Some(selector(name, key)),
        token_ref: None,
    }
}

pub fn token_auth(name: &str, key: &str) -> OriginIssuerAuthentication {
    OriginIssuerAuthentication {
        service_key_ref: None,
        token_ref: Some(selector(name, key)),
    }
}

pub fn issuer_spec(request_type: &str, auth: OriginIssuerAuthentication) -> OriginIssuerSpec {
    OriginIssuerSpec {
        request_type: request_type.to_string(),
        auth,
    }
}

/// Status carrying only a `Ready` condition with the given status
pub fn ready_status(status: ConditionStatus) -> OriginIssuerStatus {
    OriginIssuerStatus {
        conditions: vec![Condition {
            r#type: CONDITION_READY.to_string(),
            status,
            last_transition_time: None,
            reason: String::new(),
            message: String::new(),
        }],
    }
}

pub fn origin_issuer(namespace: &str, name: &str, spec: OriginIssuerSpec) -> OriginIssuer {
    let mut issuer = OriginIssuer::new(name, spec);
    issuer.metadata.namespace = Some(namespace.to_string());
    issuer.metadata.resource_version = Some("1".to_string());
    issuer
}

pub fn cluster_issuer(name: &str, spec: OriginIssuerSpec) -> ClusterOriginIssuer {
    let mut issuer = ClusterOriginIssuer::new(name, spec.into());
    issuer.metadata.resource_version = Some("1".to_string());
    issuer
}

/// A 7 day request for the fixture CSR
pub fn certificate_request(namespace: &str, name: &str, issuer_kind: &str, issuer_name: &str) -> CertificateRequest {
    CertificateRequest {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some("1".to_string()),
            ..Default::default()
        },
        spec: CertificateRequestSpec {
            request: CSR_PEM.as_bytes().to_vec(),
            duration: Some("168h0m0s".to_string()),
            issuer_ref: ObjectReference {
                name: issuer_name.to_string(),
                kind: Some(issuer_kind.to_string()),
                group: Some(ISSUER_GROUP.to_string()),
            },
        },
        status: None,
    }
}

/// Request status carrying the given conditions
pub fn request_status(conditions: Vec<Condition>) -> CertificateRequestStatus {
    CertificateRequestStatus {
        conditions,
        ..Default::default()
    }
}

/// Signing endpoint served by a mock server rooted at `base`
pub fn signing_endpoint(base: impl fmt::Display) -> String {
    format!("{}/certificates", base.to_string().trim_end_matches('/'))
}
