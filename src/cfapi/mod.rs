//! # Cloudflare Origin CA API
//!
//! Minimal client for the Origin CA certificate signing endpoint.
//!
//! A [`Client`] is built from a [`Builder`] holding exactly one credential and
//! performs a single operation: [`Client::sign`]. Responses are wrapped in the
//! standard Cloudflare envelope (`success`, `errors`, `result`); API rejections
//! surface as [`SignError::Api`] carrying the first [`ApiError`] with the
//! request's `cf-ray` id attached.

mod builder;
mod error;
mod types;

pub use builder::{Builder, Credential};
pub use error::{ApiError, BuildError, SignError};
pub use types::{expiration, SignRequest, SignResponse};

use crate::constants::RAY_ID_HEADER;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use tracing::{debug, debug_span, Instrument};
use types::Envelope;

const CLIENT_USER_AGENT: &str = concat!("origin-ca-issuer/", env!("CARGO_PKG_VERSION"));

/// Authenticated Origin CA API client
#[derive(Clone)]
pub struct Client {
    http_client: reqwest::Client,
    endpoint: reqwest::Url,
    auth_header: (HeaderName, HeaderValue),
    timeout: Option<Duration>,
}

impl Client {
    /// Submit a CSR for signing.
    ///
    /// Dropping the returned future cancels the request.
    ///
    /// # Errors
    /// Returns [`SignError::Api`] when the API rejects the request, and a transport,
    /// status or decode error when no usable answer was received.
    pub async fn sign(&self, request: &SignRequest) -> Result<SignResponse, SignError> {
        let span = debug_span!(
            "cfapi.sign",
            endpoint = %self.endpoint,
            request_type = %request.request_type,
            validity = request.validity,
        );

        async move {
            let mut builder = self
                .http_client
                .post(self.endpoint.clone())
                .header(self.auth_header.0.clone(), self.auth_header.1.clone())
                .header(USER_AGENT, CLIENT_USER_AGENT)
                .json(request);
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }

            let response = builder.send().await.map_err(SignError::Transport)?;
            let status = response.status();
            let ray_id = response
                .headers()
                .get(RAY_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let body = response.bytes().await.map_err(SignError::Transport)?;

            debug!(status = status.as_u16(), ray_id = %ray_id, "Received signing response");
            decode_response(status, ray_id, &body)
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("auth_header", &self.auth_header.0)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn decode_response(status: StatusCode, ray_id: String, body: &[u8]) -> Result<SignResponse, SignError> {
    let envelope: Envelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(SignError::Status {
                status: status.as_u16(),
                ray_id,
            })
        }
        Err(source) => return Err(SignError::Decode { source, ray_id }),
    };

    if !envelope.success || !status.is_success() {
        let mut all = envelope.errors;
        if all.is_empty() {
            if !status.is_success() {
                return Err(SignError::Status {
                    status: status.as_u16(),
                    ray_id,
                });
            }
            all.push(ApiError {
                code: 0,
                message: "request was not successful".to_string(),
                ray_id: String::new(),
            });
        }
        for error in &mut all {
            error.ray_id.clone_from(&ray_id);
        }
        let error = all.first().cloned().unwrap_or_default();
        return Err(SignError::Api { error, all });
    }

    match envelope.result {
        Some(result) => serde_json::from_value(result).map_err(|source| SignError::Decode { source, ray_id }),
        None => Err(SignError::MissingResult { ray_id }),
    }
}
