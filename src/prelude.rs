//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use origin_ca_issuer::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Signing API
pub use crate::cfapi::{ApiError, Builder as ApiClientBuilder, Client as ApiClient, Credential, SignError};

// Reconciler and its seams
pub use crate::controller::conditions::{has_condition, set_condition, Clock, SystemClock};
pub use crate::controller::reconciler::{CertificateRequestError, IssuerError, Reconciler};
pub use crate::controller::store::{
    AnyIssuer, IssuerKind, IssuerRef, KubeStore, ObjectKey, ResourceStore, SecretData, SecretStore,
    StoreError,
};

// Configuration
pub use crate::config::ControllerConfig;
