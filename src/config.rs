//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_API_ENDPOINT, DEFAULT_API_REQUEST_TIMEOUT_SECS, DEFAULT_BACKOFF_MAX_SECS,
    DEFAULT_BACKOFF_MIN_SECS, DEFAULT_CLUSTER_RESOURCE_NAMESPACE,
    DEFAULT_ISSUER_NOT_READY_REQUEUE_SECS, DEFAULT_METRICS_PORT,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from the deployment manifest.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Namespace holding secrets for cluster-scoped issuers
    pub cluster_resource_namespace: String,
    /// Signing API endpoint
    pub api_endpoint: String,
    /// Timeout applied to each signing API request (seconds)
    pub api_request_timeout_secs: u64,
    /// Requeue interval while a referenced issuer is not ready (seconds)
    pub issuer_not_ready_requeue_secs: u64,
    /// Smallest error backoff (seconds)
    pub backoff_min_secs: u64,
    /// Largest error backoff (seconds)
    pub backoff_max_secs: u64,
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cluster_resource_namespace: DEFAULT_CLUSTER_RESOURCE_NAMESPACE.to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_request_timeout_secs: DEFAULT_API_REQUEST_TIMEOUT_SECS,
            issuer_not_ready_requeue_secs: DEFAULT_ISSUER_NOT_READY_REQUEUE_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            metrics_port: DEFAULT_METRICS_PORT,
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            cluster_resource_namespace: env_var_or_default_str(
                "CLUSTER_RESOURCE_NAMESPACE",
                DEFAULT_CLUSTER_RESOURCE_NAMESPACE,
            ),
            api_endpoint: env_var_or_default_str("CLOUDFLARE_API_ENDPOINT", DEFAULT_API_ENDPOINT),
            api_request_timeout_secs: env_var_or_default(
                "API_REQUEST_TIMEOUT_SECS",
                DEFAULT_API_REQUEST_TIMEOUT_SECS,
            ),
            issuer_not_ready_requeue_secs: env_var_or_default(
                "ISSUER_NOT_READY_REQUEUE_SECS",
                DEFAULT_ISSUER_NOT_READY_REQUEUE_SECS,
            ),
            backoff_min_secs: env_var_or_default("BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS),
            backoff_max_secs: env_var_or_default("BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "json"),
        }
    }

    /// Get signing API request timeout
    pub fn api_request_timeout(&self) -> Duration {
        Duration::from_secs(self.api_request_timeout_secs)
    }

    /// Get requeue interval for requests whose issuer is not ready
    pub fn issuer_not_ready_requeue(&self) -> Duration {
        Duration::from_secs(self.issuer_not_ready_requeue_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
