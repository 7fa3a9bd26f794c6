//! # Custom Resource Definitions
//!
//! CRD types read and written by the issuer.
//!
//! ## Module Structure
//!
//! - `issuer.rs` - `OriginIssuer` and `ClusterOriginIssuer`, owned by this controller
//! - `cert_manager.rs` - cert-manager's `CertificateRequest`, owned by cert-manager
//! - `condition.rs` - Status condition shared by both
//! - `bytes.rs` - base64 encoding for Kubernetes `[]byte` fields

mod bytes;
mod cert_manager;
mod condition;
mod issuer;

// Re-export all public types
pub use cert_manager::{
    CertificateRequest, CertificateRequestSpec, CertificateRequestStatus, ObjectReference,
    CONDITION_DENIED,
};
pub use condition::{Condition, ConditionStatus, CONDITION_READY};
pub use issuer::{
    ClusterOriginIssuer, ClusterOriginIssuerSpec, OriginIssuer, OriginIssuerAuthentication,
    OriginIssuerSpec, OriginIssuerStatus, RequestType, SecretKeySelector,
};
