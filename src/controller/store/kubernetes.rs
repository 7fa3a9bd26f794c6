//! Kubernetes-backed stores.

use super::{AnyIssuer, IssuerKind, IssuerRef, ObjectKey, ResourceStore, SecretData, SecretStore, StoreError};
use crate::constants::{CLUSTER_ORIGIN_ISSUER_KIND, FIELD_MANAGER, ORIGIN_ISSUER_KIND};
use crate::crd::{CertificateRequest, ClusterOriginIssuer, OriginIssuer};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

/// [`ResourceStore`] and [`SecretStore`] over a Kubernetes client
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

fn map_kube_error(err: kube::Error, kind: &'static str, key: ObjectKey) -> StoreError {
    match err {
        kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound { kind, key },
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict { kind, key },
        other => StoreError::Api(Box::new(other)),
    }
}

/// Merge-patch the status subresource.
///
/// The patch carries the resourceVersion that was read, so the API server
/// rejects it with 409 if another writer got there first.
async fn patch_status<K, S>(api: &Api<K>, obj: &K, status: &S, kind: &'static str) -> Result<(), StoreError>
where
    K: Resource + Clone + DeserializeOwned + Debug,
    S: Serialize,
{
    let meta = obj.meta();
    let key = ObjectKey {
        namespace: meta.namespace.clone(),
        name: meta.name.clone().unwrap_or_default(),
    };
    let patch = serde_json::json!({
        "metadata": { "resourceVersion": meta.resource_version },
        "status": status,
    });

    debug!(kind, key = %key, "Patching status");
    api.patch_status(&key.name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await
        .map(|_| ())
        .map_err(|e| map_kube_error(e, kind, key))
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_issuer(&self, issuer: &IssuerRef) -> Result<AnyIssuer, StoreError> {
        match issuer.kind {
            IssuerKind::Namespaced => {
                let api: Api<OriginIssuer> =
                    Api::namespaced(self.client.clone(), issuer.namespace.as_deref().unwrap_or_default());
                api.get(&issuer.name)
                    .await
                    .map(AnyIssuer::Namespaced)
                    .map_err(|e| map_kube_error(e, ORIGIN_ISSUER_KIND, issuer.key()))
            }
            IssuerKind::Cluster => {
                let api: Api<ClusterOriginIssuer> = Api::all(self.client.clone());
                api.get(&issuer.name)
                    .await
                    .map(AnyIssuer::Cluster)
                    .map_err(|e| map_kube_error(e, CLUSTER_ORIGIN_ISSUER_KIND, issuer.key()))
            }
        }
    }

    async fn update_issuer_status(&self, issuer: &AnyIssuer) -> Result<(), StoreError> {
        match issuer {
            AnyIssuer::Namespaced(issuer) => {
                let api: Api<OriginIssuer> = Api::namespaced(
                    self.client.clone(),
                    issuer.metadata.namespace.as_deref().unwrap_or_default(),
                );
                patch_status(&api, issuer, &issuer.status, ORIGIN_ISSUER_KIND).await
            }
            AnyIssuer::Cluster(issuer) => {
                let api: Api<ClusterOriginIssuer> = Api::all(self.client.clone());
                patch_status(&api, issuer, &issuer.status, CLUSTER_ORIGIN_ISSUER_KIND).await
            }
        }
    }

    async fn get_certificate_request(&self, key: &ObjectKey) -> Result<CertificateRequest, StoreError> {
        let api: Api<CertificateRequest> =
            Api::namespaced(self.client.clone(), key.namespace.as_deref().unwrap_or_default());
        api.get(&key.name)
            .await
            .map_err(|e| map_kube_error(e, "CertificateRequest", key.clone()))
    }

    async fn update_certificate_request_status(&self, request: &CertificateRequest) -> Result<(), StoreError> {
        let api: Api<CertificateRequest> = Api::namespaced(
            self.client.clone(),
            request.metadata.namespace.as_deref().unwrap_or_default(),
        );
        patch_status(&api, request, &request.status, "CertificateRequest").await
    }
}

#[async_trait]
impl SecretStore for KubeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api
            .get_opt(name)
            .await
            .map_err(|e| map_kube_error(e, "Secret", ObjectKey::namespaced(namespace, name)))?;

        Ok(secret.map(|secret| {
            secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }
}
