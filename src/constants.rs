//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// API group of the issuer resources owned by this controller
pub const ISSUER_GROUP: &str = "cert-manager.k8s.cloudflare.com";

/// Kind of the namespaced issuer
pub const ORIGIN_ISSUER_KIND: &str = "OriginIssuer";

/// Kind of the cluster-scoped issuer
pub const CLUSTER_ORIGIN_ISSUER_KIND: &str = "ClusterOriginIssuer";

/// Field manager used for status writes
pub const FIELD_MANAGER: &str = "origin-ca-issuer";

/// Default Cloudflare Origin CA signing endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.cloudflare.com/client/v4/certificates";

/// Response header carrying the Cloudflare correlation identifier
pub const RAY_ID_HEADER: &str = "cf-ray";

/// Header used for Origin CA service key authentication
pub const SERVICE_KEY_HEADER: &str = "x-auth-user-service-key";

/// Default namespace for secrets referenced by cluster-scoped issuers
pub const DEFAULT_CLUSTER_RESOURCE_NAMESPACE: &str = "cert-manager";

/// Default timeout for a single signing API request (seconds)
pub const DEFAULT_API_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default requeue interval while the referenced issuer is not ready (seconds)
pub const DEFAULT_ISSUER_NOT_READY_REQUEUE_SECS: u64 = 30;

/// Default minimum error backoff (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default maximum error backoff (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Validity requested when a CertificateRequest has no duration (cert-manager's default of 90 days)
pub const DEFAULT_VALIDITY_DAYS: u32 = 90;

/// Seconds in one day, used to truncate requested durations to whole days
pub const SECONDS_PER_DAY: u64 = 86_400;
