//! # Reconciler
//!
//! Level-triggered reconciliation of issuers and certificate requests.
//!
//! Every call re-reads the object from the [`ResourceStore`], computes the
//! desired status and writes it back only when it changed. Nothing is cached
//! between calls, so replays and out-of-order triggers are harmless. Retry
//! timing belongs to the caller: errors are returned, never slept on.
//!
//! - `issuer`: validates `OriginIssuer`/`ClusterOriginIssuer` and sets `Ready`
//! - `certificate_request`: signs `CertificateRequest`s through a ready issuer

mod certificate_request;
mod issuer;

pub use certificate_request::CertificateRequestError;
pub use issuer::{validate_issuer_spec, IssuerError, ValidationError};

use crate::cfapi;
use crate::config::ControllerConfig;
use crate::constants::{DEFAULT_CLUSTER_RESOURCE_NAMESPACE, DEFAULT_ISSUER_NOT_READY_REQUEUE_SECS};
use crate::controller::conditions::{Clock, SystemClock};
use crate::controller::store::{ResourceStore, SecretStore};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Shared reconciliation context
///
/// Cheap to share behind an `Arc`; holds no per-object state.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn ResourceStore>,
    secrets: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
    api: cfapi::Builder,
    cluster_resource_namespace: String,
    issuer_not_ready_requeue: Duration,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            secrets,
            clock: Arc::new(SystemClock),
            api: cfapi::Builder::new(),
            cluster_resource_namespace: DEFAULT_CLUSTER_RESOURCE_NAMESPACE.to_string(),
            issuer_not_ready_requeue: Duration::from_secs(DEFAULT_ISSUER_NOT_READY_REQUEUE_SECS),
        }
    }

    /// Reconciler configured from the controller configuration
    #[must_use]
    pub fn from_config(
        store: Arc<dyn ResourceStore>,
        secrets: Arc<dyn SecretStore>,
        config: &ControllerConfig,
    ) -> Self {
        let api = cfapi::Builder::new()
            .with_endpoint(config.api_endpoint.clone())
            .with_timeout(config.api_request_timeout());

        Self::new(store, secrets)
            .with_api_builder(api)
            .with_cluster_resource_namespace(config.cluster_resource_namespace.clone())
            .with_issuer_not_ready_requeue(config.issuer_not_ready_requeue())
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Template for API clients. The issuer's credential is added per call.
    #[must_use]
    pub fn with_api_builder(mut self, api: cfapi::Builder) -> Self {
        self.api = api;
        self
    }

    /// Namespace holding secrets of cluster-scoped issuers
    #[must_use]
    pub fn with_cluster_resource_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.cluster_resource_namespace = namespace.into();
        self
    }

    /// Delay before re-checking a request whose issuer is not ready
    #[must_use]
    pub fn with_issuer_not_ready_requeue(mut self, delay: Duration) -> Self {
        self.issuer_not_ready_requeue = delay;
        self
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("clock", &self.clock)
            .field("api", &self.api)
            .field("cluster_resource_namespace", &self.cluster_resource_namespace)
            .field("issuer_not_ready_requeue", &self.issuer_not_ready_requeue)
            .finish_non_exhaustive()
    }
}
