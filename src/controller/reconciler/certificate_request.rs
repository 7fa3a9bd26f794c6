//! CertificateRequest reconciliation.
//!
//! Requests pointing at one of our issuers are signed through the Origin CA
//! API once the issuer reports `Ready=True`. A request that already carries
//! `Ready=True` is never signed again.

use super::issuer::{validate_issuer_spec, ValidationError};
use super::Reconciler;
use crate::cfapi::{BuildError, SignError, SignRequest};
use crate::controller::conditions::{find_condition, format_time, has_condition, set_condition};
use crate::controller::credentials::{resolve_credential, CredentialError};
use crate::controller::csr::{self, CsrError};
use crate::controller::duration::{requested_validity_days, DurationError};
use crate::controller::store::{IssuerRef, ObjectKey, StoreError};
use crate::crd::{
    CertificateRequest, CertificateRequestStatus, ConditionStatus, CONDITION_DENIED, CONDITION_READY,
};
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

const REASON_ISSUED: &str = "Issued";
const REASON_PENDING: &str = "Pending";
const REASON_FAILED: &str = "Failed";
const REASON_DENIED: &str = "Denied";

#[derive(Debug, Error)]
pub enum CertificateRequestError {
    #[error("failed to fetch CertificateRequest {key}: {source}")]
    Fetch {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("failed to fetch {issuer}: {source}")]
    Issuer {
        issuer: IssuerRef,
        #[source]
        source: StoreError,
    },

    #[error("issuer {issuer} does not have an authentication method configured")]
    MissingAuthentication { issuer: String },

    #[error("issuer {issuer} credentials are unavailable: {source}")]
    Credential {
        issuer: String,
        #[source]
        source: CredentialError,
    },

    #[error("issuer {issuer} is invalid: {source}")]
    InvalidIssuer {
        issuer: String,
        #[source]
        source: ValidationError,
    },

    #[error("invalid certificate request: {0}")]
    Csr(#[from] CsrError),

    #[error("invalid certificate request duration: {0}")]
    Duration(#[from] DurationError),

    #[error("unable to create Cloudflare API client: {0}")]
    Client(#[from] BuildError),

    #[error("unable to sign request: {0}")]
    Sign(#[from] SignError),

    #[error("failed to update status of CertificateRequest {key}: {source}")]
    StatusWrite {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },
}

impl CertificateRequestError {
    /// Whether another attempt can succeed without the request, its issuer
    /// or the issuer's secret being changed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CertificateRequestError::Fetch { .. }
            | CertificateRequestError::Issuer { .. }
            | CertificateRequestError::MissingAuthentication { .. }
            | CertificateRequestError::StatusWrite { .. } => true,
            CertificateRequestError::Credential { source, .. } => source.is_transient(),
            CertificateRequestError::Client(err) => matches!(err, BuildError::HttpClient(_)),
            CertificateRequestError::Sign(err) => err.is_retryable(),
            CertificateRequestError::InvalidIssuer { .. }
            | CertificateRequestError::Csr(_)
            | CertificateRequestError::Duration(_) => false,
        }
    }
}

impl Reconciler {
    /// Reconcile one cert-manager `CertificateRequest`.
    ///
    /// # Errors
    /// Failures are recorded on the request's `Ready` condition (best effort)
    /// and returned so the caller can schedule a retry. A request whose issuer
    /// is not ready yet is requeued without error.
    #[instrument(skip(self), fields(namespace = key.namespace.as_deref().unwrap_or_default(), name = %key.name))]
    pub async fn reconcile_certificate_request(&self, key: &ObjectKey) -> Result<Action, CertificateRequestError> {
        let mut request = match self.store.get_certificate_request(key).await {
            Ok(request) => request,
            Err(err) if err.is_not_found() => {
                debug!("CertificateRequest no longer exists");
                return Ok(Action::await_change());
            }
            Err(source) => {
                return Err(CertificateRequestError::Fetch {
                    key: key.clone(),
                    source,
                })
            }
        };

        // Status as persisted; every write below is diffed against it.
        let persisted = request.status.clone();

        let Some(issuer_ref) = IssuerRef::for_certificate_request(&request) else {
            debug!(
                kind = request.spec.issuer_ref.kind.as_deref().unwrap_or_default(),
                group = request.spec.issuer_ref.group.as_deref().unwrap_or_default(),
                "CertificateRequest references an issuer owned by another controller"
            );
            return Ok(Action::await_change());
        };

        let conditions = persisted
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default();

        if has_condition(conditions, CONDITION_READY, ConditionStatus::True) {
            debug!("CertificateRequest already issued");
            return Ok(Action::await_change());
        }

        if has_condition(conditions, CONDITION_DENIED, ConditionStatus::True) {
            let already_denied = find_condition(conditions, CONDITION_READY)
                .is_some_and(|c| c.status == ConditionStatus::False && c.reason == REASON_DENIED);
            if !already_denied {
                info!("CertificateRequest was denied, not signing");
                self.mark_failed(
                    &mut request,
                    persisted.as_ref(),
                    REASON_DENIED,
                    "The CertificateRequest was denied by an approval controller",
                )
                .await?;
            }
            return Ok(Action::await_change());
        }

        let issuer = match self.store.get_issuer(&issuer_ref).await {
            Ok(issuer) => issuer,
            Err(source) => {
                let err = CertificateRequestError::Issuer {
                    issuer: issuer_ref.clone(),
                    source,
                };
                self.record_pending(&mut request, persisted.as_ref(), &err.to_string()).await;
                return Err(err);
            }
        };

        let issuer_ready = issuer
            .status()
            .is_some_and(|s| has_condition(&s.conditions, CONDITION_READY, ConditionStatus::True));
        if !issuer_ready {
            info!(issuer = %issuer_ref, "Issuer is not ready, requeueing");
            self.set_request_ready(
                &mut request,
                persisted.as_ref(),
                ConditionStatus::False,
                REASON_PENDING,
                &format!("issuer {} is not ready", issuer_ref.name),
            )
            .await?;
            return Ok(Action::requeue(self.issuer_not_ready_requeue));
        }

        let namespace = issuer_ref.effective_namespace(&self.cluster_resource_namespace);
        let credential = match resolve_credential(&*self.secrets, &issuer.spec().auth, namespace).await {
            Ok(credential) => credential,
            Err(CredentialError::MissingAuthentication) => {
                let err = CertificateRequestError::MissingAuthentication {
                    issuer: issuer_ref.name.clone(),
                };
                self.record_pending(&mut request, persisted.as_ref(), &err.to_string()).await;
                return Err(err);
            }
            Err(source) => {
                let err = CertificateRequestError::Credential {
                    issuer: issuer_ref.name.clone(),
                    source,
                };
                self.record_pending(&mut request, persisted.as_ref(), &err.to_string()).await;
                return Err(err);
            }
        };

        let request_type = match validate_issuer_spec(issuer.spec()) {
            Ok(request_type) => request_type,
            Err(source) => {
                let err = CertificateRequestError::InvalidIssuer {
                    issuer: issuer_ref.name.clone(),
                    source,
                };
                self.record_pending(&mut request, persisted.as_ref(), &err.to_string()).await;
                return Err(err);
            }
        };

        let sign_request = match build_sign_request(&request, request_type.as_api_str()) {
            Ok(sign_request) => sign_request,
            Err(err) => {
                error!(error = %err, "CertificateRequest cannot be signed");
                if let Err(write_err) = self
                    .mark_failed(&mut request, persisted.as_ref(), REASON_FAILED, &err.to_string())
                    .await
                {
                    warn!(error = %write_err, "Failed to record CertificateRequest status");
                }
                return Err(err);
            }
        };

        let client = match self.api.clone().with_credential(credential).build() {
            Ok(client) => client,
            Err(err) => {
                let err = CertificateRequestError::from(err);
                self.record_failed(&mut request, persisted.as_ref(), &err.to_string()).await;
                return Err(err);
            }
        };

        debug!(
            hostnames = ?sign_request.hostnames,
            validity = sign_request.validity,
            request_type = %sign_request.request_type,
            "Submitting signing request"
        );
        let started = Instant::now();
        let result = client.sign(&sign_request).await;
        metrics::observe_sign_duration(started.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                metrics::increment_sign_requests("success");
                info!(certificate_id = %response.id, expires = %format_time(response.expiration), "Certificate issued");

                let status = request.status.get_or_insert_with(Default::default);
                status.certificate = Some(response.certificate.into_bytes());
                status.failure_time = None;
                self.set_request_ready(
                    &mut request,
                    persisted.as_ref(),
                    ConditionStatus::True,
                    REASON_ISSUED,
                    "Certificate issued",
                )
                .await?;
                Ok(Action::await_change())
            }
            Err(err) => {
                metrics::increment_sign_requests("error");
                let err = CertificateRequestError::from(err);
                error!(error = %err, "Failed to sign CertificateRequest");
                self.record_failed(&mut request, persisted.as_ref(), &err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Best-effort `Ready=False/Pending`; a write failure is logged so the
    /// original error is the one returned.
    async fn record_pending(
        &self,
        request: &mut CertificateRequest,
        persisted: Option<&CertificateRequestStatus>,
        message: &str,
    ) {
        if let Err(write_err) = self
            .set_request_ready(request, persisted, ConditionStatus::False, REASON_PENDING, message)
            .await
        {
            warn!(error = %write_err, "Failed to record CertificateRequest status");
        }
    }

    /// Best-effort `Ready=False/Failed` for a retryable failure
    async fn record_failed(
        &self,
        request: &mut CertificateRequest,
        persisted: Option<&CertificateRequestStatus>,
        message: &str,
    ) {
        if let Err(write_err) = self
            .set_request_ready(request, persisted, ConditionStatus::False, REASON_FAILED, message)
            .await
        {
            warn!(error = %write_err, "Failed to record CertificateRequest status");
        }
    }

    /// Terminal failure: `Ready=False` plus `failureTime`
    async fn mark_failed(
        &self,
        request: &mut CertificateRequest,
        persisted: Option<&CertificateRequestStatus>,
        reason: &str,
        message: &str,
    ) -> Result<(), CertificateRequestError> {
        let now = format_time(self.clock.now());
        let status = request.status.get_or_insert_with(Default::default);
        if status.failure_time.is_none() {
            status.failure_time = Some(now);
        }
        self.set_request_ready(request, persisted, ConditionStatus::False, reason, message)
            .await
    }

    async fn set_request_ready(
        &self,
        request: &mut CertificateRequest,
        persisted: Option<&CertificateRequestStatus>,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Result<(), CertificateRequestError> {
        let now = self.clock.now();
        set_condition(
            &mut request.status.get_or_insert_with(Default::default).conditions,
            CONDITION_READY,
            status,
            reason,
            message,
            now,
        );

        if request.status.as_ref() == persisted {
            debug!(reason, "CertificateRequest status unchanged, skipping update");
            return Ok(());
        }

        self.store
            .update_certificate_request_status(request)
            .await
            .map_err(|source| CertificateRequestError::StatusWrite {
                key: ObjectKey::from_resource(request),
                source,
            })?;
        info!(%status, reason, "Updated CertificateRequest status");
        Ok(())
    }
}

/// Hostnames, validity and CSR for the signing API
fn build_sign_request(request: &CertificateRequest, request_type: &str) -> Result<SignRequest, CertificateRequestError> {
    let hostnames = csr::dns_names(&request.spec.request)?;
    let validity = requested_validity_days(request.spec.duration.as_deref())?;

    Ok(SignRequest {
        hostnames,
        csr: String::from_utf8_lossy(&request.spec.request).into_owned(),
        validity,
        request_type: request_type.to_string(),
    })
}
