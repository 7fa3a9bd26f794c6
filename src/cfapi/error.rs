//! # API Errors
//!
//! Error types for building the client and calling the signing API.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error reported by the Cloudflare API inside a response envelope
///
/// Two `ApiError`s are equal when their `code` is equal, so a caller can match
/// a class of failure (`ApiError::new(1100)`) without comparing messages or ray ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    /// Correlation id from the `cf-ray` response header
    #[serde(skip)]
    pub ray_id: String,
}

impl ApiError {
    /// Error value matching every `ApiError` with the given code
    #[must_use]
    pub fn new(code: i64) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Whether this error carries the given API error code
    #[must_use]
    pub fn is(&self, code: i64) -> bool {
        self.code == code
    }

    /// Walk an error's source chain looking for an `ApiError`.
    ///
    /// Wrapping an error (for example in a reconciler error) keeps it discoverable.
    #[must_use]
    pub fn find<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a ApiError> {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(api_error) = e.downcast_ref::<ApiError>() {
                return Some(api_error);
            }
            current = e.source();
        }
        None
    }
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cloudflare API Error code={} message={} ray_id={}",
            self.code, self.message, self.ray_id
        )
    }
}

impl std::error::Error for ApiError {}

/// Failure to construct a [`super::Client`]
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("neither a service key nor an API token was configured")]
    MissingCredentials,

    #[error("invalid API endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("credential contains characters that are not valid in an HTTP header")]
    InvalidCredential,

    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failure of a signing call
#[derive(Debug, Error)]
pub enum SignError {
    /// The API answered with `success: false`. `error` is the first reported
    /// error; `all` keeps every error for diagnostics.
    #[error("{error}")]
    Api {
        #[source]
        error: ApiError,
        all: Vec<ApiError>,
    },

    /// The request never produced a response (timeout, connection refused, TLS).
    #[error("request to Cloudflare API failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-2xx response without a readable envelope
    #[error("Cloudflare API returned HTTP {status} ray_id={ray_id}")]
    Status { status: u16, ray_id: String },

    /// The response body could not be decoded. Retrying will not help.
    #[error("unable to decode Cloudflare API response ray_id={ray_id}: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        ray_id: String,
    },

    #[error("Cloudflare API reported success without a result ray_id={ray_id}")]
    MissingResult { ray_id: String },
}

impl SignError {
    /// The representative API error, if the API itself rejected the request
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SignError::Api { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SignError::Decode { .. })
    }
}
