//! # Credentials
//!
//! Resolves an issuer's authentication reference into credential bytes.
//!
//! A missing secret usually means the secret has not been created yet and is
//! worth retrying. A missing key is a configuration defect that only an
//! operator can fix.

use crate::cfapi::Credential;
use crate::controller::store::{SecretStore, StoreError};
use crate::crd::{OriginIssuerAuthentication, SecretKeySelector};
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("secret {name} does not contain key \"{key}\"")]
    KeyNotFound { name: String, key: String },

    #[error("secret {name} key \"{key}\" is empty")]
    EmptyKey { name: String, key: String },

    #[error("failed to read secret {namespace}/{name}: {source}")]
    Store {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("no authentication methods were configured")]
    MissingAuthentication,
}

impl CredentialError {
    /// Whether the failure may resolve itself without operator action
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, CredentialError::SecretNotFound { .. } | CredentialError::Store { .. })
    }

    /// Whether the referenced secret or key does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CredentialError::SecretNotFound { .. }
                | CredentialError::KeyNotFound { .. }
                | CredentialError::EmptyKey { .. }
        )
    }
}

/// Fetch the bytes referenced by `selector` from a secret in `namespace`.
///
/// Surrounding ASCII whitespace is trimmed.
pub async fn resolve(
    secrets: &dyn SecretStore,
    selector: &SecretKeySelector,
    namespace: &str,
) -> Result<Zeroizing<Vec<u8>>, CredentialError> {
    debug!(namespace, secret = %selector.name, key = %selector.key, "Resolving credential");

    let data = secrets
        .get_secret(namespace, &selector.name)
        .await
        .map_err(|source| match source {
            StoreError::NotFound { .. } => CredentialError::SecretNotFound {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
            },
            source => CredentialError::Store {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
                source,
            },
        })?
        .ok_or_else(|| CredentialError::SecretNotFound {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
        })?;

    let value = data.get(&selector.key).ok_or_else(|| CredentialError::KeyNotFound {
        name: selector.name.clone(),
        key: selector.key.clone(),
    })?;

    let trimmed = value.trim_ascii();
    if trimmed.is_empty() {
        return Err(CredentialError::EmptyKey {
            name: selector.name.clone(),
            key: selector.key.clone(),
        });
    }

    Ok(Zeroizing::new(trimmed.to_vec()))
}

/// Resolve whichever authentication method is configured.
///
/// A service key takes precedence over a token when both are set.
pub async fn resolve_credential(
    secrets: &dyn SecretStore,
    auth: &OriginIssuerAuthentication,
    namespace: &str,
) -> Result<Credential, CredentialError> {
    if auth.has_both_refs() {
        warn!(
            namespace,
            "Both serviceKeyRef and tokenRef are set, using serviceKeyRef and ignoring tokenRef"
        );
    }
    if let Some(selector) = &auth.service_key_ref {
        return resolve(secrets, selector, namespace).await.map(Credential::ServiceKey);
    }
    if let Some(selector) = &auth.token_ref {
        return resolve(secrets, selector, namespace).await.map(Credential::Token);
    }
    Err(CredentialError::MissingAuthentication)
}
