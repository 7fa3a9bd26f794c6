//! # Client Builder
//!
//! Immutable configuration for [`Client`]. A builder is cheap to clone, so a
//! template can be shared between concurrent reconciliations and specialised
//! per call with the issuer's credential.

use super::error::BuildError;
use super::Client;
use crate::constants::{DEFAULT_API_ENDPOINT, SERVICE_KEY_HEADER};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Credential accepted by the signing API
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Origin CA service key, sent as `X-Auth-User-Service-Key`
    ServiceKey(Zeroizing<Vec<u8>>),
    /// API token, sent as `Authorization: Bearer`
    Token(Zeroizing<Vec<u8>>),
}

impl Credential {
    fn header(&self) -> Result<(HeaderName, HeaderValue), BuildError> {
        let (name, mut value) = match self {
            Credential::ServiceKey(key) => (
                HeaderName::from_static(SERVICE_KEY_HEADER),
                HeaderValue::from_bytes(key).map_err(|_err| BuildError::InvalidCredential)?,
            ),
            Credential::Token(token) => {
                let mut bearer = Zeroizing::new(b"Bearer ".to_vec());
                bearer.extend_from_slice(token);
                (
                    AUTHORIZATION,
                    HeaderValue::from_bytes(&bearer).map_err(|_err| BuildError::InvalidCredential)?,
                )
            }
        };
        value.set_sensitive(true);
        Ok((name, value))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ServiceKey(_) => f.write_str("ServiceKey(***)"),
            Credential::Token(_) => f.write_str("Token(***)"),
        }
    }
}

/// Builder for [`Client`]
///
/// Service key and token are mutually exclusive: setting one replaces the other.
#[derive(Clone, Default)]
pub struct Builder {
    http_client: Option<reqwest::Client>,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    credential: Option<Credential>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate with an Origin CA service key
    #[must_use]
    pub fn with_service_key(self, key: impl Into<Vec<u8>>) -> Self {
        self.with_credential(Credential::ServiceKey(Zeroizing::new(key.into())))
    }

    /// Authenticate with an API token
    #[must_use]
    pub fn with_token(self, token: impl Into<Vec<u8>>) -> Self {
        self.with_credential(Credential::Token(Zeroizing::new(token.into())))
    }

    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Use a preconfigured HTTP client (custom roots, proxies, test transports)
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Override the signing endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Timeout applied to each signing request
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a client.
    ///
    /// # Errors
    /// Returns [`BuildError::MissingCredentials`] when neither a service key nor a
    /// token was set, or an error for an unusable endpoint or credential.
    pub fn build(&self) -> Result<Client, BuildError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(BuildError::MissingCredentials)?;
        let auth_header = credential.header()?;

        let endpoint = self.endpoint.as_deref().unwrap_or(DEFAULT_API_ENDPOINT);
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| BuildError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let http_client = match &self.http_client {
            Some(client) => client.clone(),
            None => reqwest::Client::builder()
                .build()
                .map_err(BuildError::HttpClient)?,
        };

        Ok(Client {
            http_client,
            endpoint,
            auth_header,
            timeout: self.timeout,
        })
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_credentials_fails() {
        let err = Builder::new().build().unwrap_err();
        assert!(matches!(err, BuildError::MissingCredentials));
    }

    #[test]
    fn test_service_key_header() {
        let client = Builder::new()
            .with_service_key("v1.0-FFFF-FFFF")
            .build()
            .unwrap();
        let (name, value) = &client.auth_header;
        assert_eq!(name.as_str(), "x-auth-user-service-key");
        assert_eq!(value.to_str().unwrap(), "v1.0-FFFF-FFFF");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_token_header() {
        let client = Builder::new().with_token("api-token").build().unwrap();
        let (name, value) = &client.auth_header;
        assert_eq!(name, &AUTHORIZATION);
        assert_eq!(value.to_str().unwrap(), "Bearer api-token");
    }

    #[test]
    fn test_later_credential_replaces_earlier() {
        let client = Builder::new()
            .with_service_key("v1.0-FFFF-FFFF")
            .with_token("api-token")
            .build()
            .unwrap();
        assert_eq!(client.auth_header.0, AUTHORIZATION);
    }

    #[test]
    fn test_default_and_overridden_endpoint() {
        let client = Builder::new().with_token("t").build().unwrap();
        assert_eq!(client.endpoint.as_str(), DEFAULT_API_ENDPOINT);

        let client = Builder::new()
            .with_token("t")
            .with_endpoint("http://127.0.0.1:8080/certificates")
            .build()
            .unwrap();
        assert_eq!(client.endpoint.as_str(), "http://127.0.0.1:8080/certificates");
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = Builder::new()
            .with_token("t")
            .with_endpoint("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_credential_with_newline_is_rejected() {
        let err = Builder::new()
            .with_token("api-token\n")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidCredential));
    }

    #[test]
    fn test_debug_redacts_credential() {
        let builder = Builder::new().with_service_key("v1.0-FFFF-FFFF");
        let debug = format!("{builder:?}");
        assert!(debug.contains("ServiceKey(***)"));
        assert!(!debug.contains("FFFF"));
    }
}
