//! Issuer reconciliation.
//!
//! Validates the spec, checks that the referenced credential can be read and
//! records the outcome in the `Ready` condition. Spec validation failures are
//! returned without touching status.

use super::Reconciler;
use crate::controller::conditions::set_condition;
use crate::controller::credentials::{resolve_credential, CredentialError};
use crate::controller::store::{AnyIssuer, IssuerRef, StoreError};
use crate::crd::{ConditionStatus, OriginIssuerSpec, RequestType, CONDITION_READY};
use kube_runtime::controller::Action;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

const REASON_VERIFIED: &str = "Verified";
const REASON_NOT_FOUND: &str = "NotFound";
const REASON_ERROR: &str = "Error";
const REASON_MISSING_AUTHENTICATION: &str = "MissingAuthentication";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("spec.requestType cannot be empty")]
    EmptyRequestType,

    #[error("spec.requestType has invalid value {0:?}")]
    InvalidRequestType(String),
}

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to retrieve auth secret: {0}")]
    Credential(#[source] CredentialError),

    #[error("failed to fetch {issuer}: {source}")]
    Fetch {
        issuer: IssuerRef,
        #[source]
        source: StoreError,
    },

    #[error("failed to update status of {issuer}: {source}")]
    StatusWrite {
        issuer: IssuerRef,
        #[source]
        source: StoreError,
    },
}

impl IssuerError {
    /// Whether another attempt can succeed without the issuer or its secret
    /// being changed. Only a missing secret or a store failure qualifies
    /// among credential errors.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            IssuerError::Validation(_) => false,
            IssuerError::Credential(err) => err.is_transient(),
            IssuerError::Fetch { .. } | IssuerError::StatusWrite { .. } => true,
        }
    }
}

/// Check that `requestType` names a supported signature algorithm.
pub fn validate_issuer_spec(spec: &OriginIssuerSpec) -> Result<RequestType, ValidationError> {
    if spec.request_type.is_empty() {
        return Err(ValidationError::EmptyRequestType);
    }
    spec.request_type
        .parse()
        .map_err(ValidationError::InvalidRequestType)
}

impl Reconciler {
    /// Reconcile one `OriginIssuer` or `ClusterOriginIssuer`.
    ///
    /// # Errors
    /// Validation errors are returned as-is with no status change. Credential
    /// errors are recorded as `Ready=False` before being returned.
    #[instrument(skip(self), fields(kind = %issuer_ref.kind, name = %issuer_ref.name, namespace = issuer_ref.namespace.as_deref().unwrap_or_default()))]
    pub async fn reconcile_issuer(&self, issuer_ref: &IssuerRef) -> Result<Action, IssuerError> {
        let mut issuer = match self.store.get_issuer(issuer_ref).await {
            Ok(issuer) => issuer,
            Err(err) if err.is_not_found() => {
                debug!("Issuer no longer exists");
                return Ok(Action::await_change());
            }
            Err(source) => {
                return Err(IssuerError::Fetch {
                    issuer: issuer_ref.clone(),
                    source,
                })
            }
        };

        if let Err(err) = validate_issuer_spec(issuer.spec()) {
            error!(error = %err, "Failed to validate issuer");
            return Err(err.into());
        }

        let namespace = issuer_ref.effective_namespace(&self.cluster_resource_namespace);
        match resolve_credential(&*self.secrets, &issuer.spec().auth, namespace).await {
            Ok(_) => {
                self.set_issuer_ready(
                    &mut issuer,
                    ConditionStatus::True,
                    REASON_VERIFIED,
                    "OriginIssuer verified and ready to sign certificates",
                )
                .await?;
                Ok(Action::await_change())
            }
            Err(CredentialError::MissingAuthentication) => {
                warn!("Issuer has no authentication method configured");
                self.set_issuer_ready(
                    &mut issuer,
                    ConditionStatus::False,
                    REASON_MISSING_AUTHENTICATION,
                    "No authentication methods were configured",
                )
                .await?;
                // Terminal until the spec changes.
                Ok(Action::await_change())
            }
            Err(err) => {
                error!(error = %err, "Failed to retrieve issuer auth secret");
                let reason = if err.is_not_found() {
                    REASON_NOT_FOUND
                } else {
                    REASON_ERROR
                };
                let message = format!("Failed to retrieve auth secret: {err}");
                if let Err(write_err) = self
                    .set_issuer_ready(&mut issuer, ConditionStatus::False, reason, &message)
                    .await
                {
                    warn!(error = %write_err, "Failed to record issuer status");
                }
                Err(IssuerError::Credential(err))
            }
        }
    }

    /// Set the `Ready` condition and persist it if anything changed.
    async fn set_issuer_ready(
        &self,
        issuer: &mut AnyIssuer,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Result<(), IssuerError> {
        let before = issuer.status().cloned();
        let now = self.clock.now();
        set_condition(
            &mut issuer.status_mut().conditions,
            CONDITION_READY,
            status,
            reason,
            message,
            now,
        );

        if issuer.status() == before.as_ref() {
            debug!(reason, "Issuer status unchanged, skipping update");
            return Ok(());
        }

        self.store
            .update_issuer_status(issuer)
            .await
            .map_err(|source| IssuerError::StatusWrite {
                issuer: issuer.reference(),
                source,
            })?;
        info!(%status, reason, "Updated issuer status");
        Ok(())
    }
}
