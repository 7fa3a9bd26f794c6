//! # Origin Issuers
//!
//! `OriginIssuer` (namespaced) and `ClusterOriginIssuer` (cluster-scoped) represent
//! the Cloudflare Origin CA as an external cert-manager issuer. Both share the same
//! spec and status; they differ only in where their credential secret is read from.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: cert-manager.k8s.cloudflare.com/v1
//! kind: OriginIssuer
//! metadata:
//!   name: prod-issuer
//!   namespace: default
//! spec:
//!   requestType: OriginECC
//!   auth:
//!     tokenRef:
//!       name: cfapi-token
//!       key: key
//! ```

use super::condition::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Specification of an OriginIssuer
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "OriginIssuer",
    group = "cert-manager.k8s.cloudflare.com",
    version = "v1",
    namespaced,
    status = "OriginIssuerStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OriginIssuerSpec {
    /// Signature algorithm Cloudflare should use to sign certificates.
    /// One of `OriginRSA`, `OriginECC`.
    #[serde(default)]
    pub request_type: String,
    /// How to authenticate with the Cloudflare API
    #[serde(default)]
    pub auth: OriginIssuerAuthentication,
}

/// Specification of a ClusterOriginIssuer
///
/// Identical to [`OriginIssuerSpec`]; secrets are resolved from the controller's
/// cluster resource namespace.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "ClusterOriginIssuer",
    group = "cert-manager.k8s.cloudflare.com",
    version = "v1",
    status = "OriginIssuerStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
pub struct ClusterOriginIssuerSpec {
    #[serde(flatten)]
    pub issuer: OriginIssuerSpec,
}

impl From<OriginIssuerSpec> for ClusterOriginIssuerSpec {
    fn from(issuer: OriginIssuerSpec) -> Self {
        Self { issuer }
    }
}

/// Status of an issuer. Known condition types are `Ready`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriginIssuerStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Authentication with the Cloudflare API. Only one reference may be set.
///
/// If both are set anyway, `serviceKeyRef` is used and `tokenRef` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriginIssuerAuthentication {
    /// Authenticate with an Origin CA service key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key_ref: Option<SecretKeySelector>,
    /// Authenticate with an API token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretKeySelector>,
}

impl OriginIssuerAuthentication {
    /// Whether both a service key and a token are referenced
    #[must_use]
    pub fn has_both_refs(&self) -> bool {
        self.service_key_ref.is_some() && self.token_ref.is_some()
    }
}

/// Reference to a key within a secret
///
/// For namespaced issuers the secret lives in the issuer's namespace; for
/// cluster-scoped issuers it lives in the cluster resource namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct SecretKeySelector {
    /// Name of the secret
    pub name: String,
    /// Key within the secret
    pub key: String,
}

/// Signature algorithm used to sign certificates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// RSA256 signature
    OriginRsa,
    /// ECDSA signature
    OriginEcc,
}

impl RequestType {
    /// Value understood by the signing API
    #[must_use]
    pub fn as_api_str(&self) -> &'static str {
        match self {
            RequestType::OriginRsa => "origin-rsa",
            RequestType::OriginEcc => "origin-ecc",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::OriginRsa => f.write_str("OriginRSA"),
            RequestType::OriginEcc => f.write_str("OriginECC"),
        }
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OriginRSA" => Ok(RequestType::OriginRsa),
            "OriginECC" => Ok(RequestType::OriginEcc),
            other => Err(other.to_string()),
        }
    }
}
