//! # Watch Loop
//!
//! Runs one `kube-runtime` controller per resource kind and adapts watched
//! objects to the reconcilers' key-based entry points. The reconcilers
//! re-read each object themselves, so the watched copy only supplies its key.

use super::error_policy::{backoff_key, handle_reconciliation_error};
use super::Context;
use crate::constants::{CLUSTER_ORIGIN_ISSUER_KIND, ORIGIN_ISSUER_KIND};
use crate::controller::reconciler::{CertificateRequestError, IssuerError};
use crate::controller::store::{IssuerRef, ObjectKey};
use crate::crd::{CertificateRequest, ClusterOriginIssuer, OriginIssuer};
use crate::observability::metrics;
use crate::server::ServerState;
use futures::{Future, StreamExt};
use kube::api::Api;
use kube::{Client, ResourceExt};
use kube_runtime::{controller::Action, watcher, Controller};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const CERTIFICATE_REQUEST_KIND: &str = "CertificateRequest";

/// Run all watch loops until a shutdown signal arrives.
///
/// # Errors
/// Currently infallible; the controllers log and retry their own failures.
pub async fn run_watch_loop(
    client: Client,
    ctx: Arc<Context>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loops...");

    let issuers: Api<OriginIssuer> = Api::all(client.clone());
    let cluster_issuers: Api<ClusterOriginIssuer> = Api::all(client.clone());
    let requests: Api<CertificateRequest> = Api::all(client);

    let issuer_controller = Controller::new(issuers, watcher::Config::default().any_semantic())
        .shutdown_on_signal()
        .run(
            reconcile_origin_issuer,
            |obj, error: &IssuerError, ctx| {
                handle_reconciliation_error(
                    ORIGIN_ISSUER_KIND,
                    &ObjectKey::from_resource(obj.as_ref()),
                    error,
                    error.is_retryable(),
                    &ctx,
                )
            },
            Arc::clone(&ctx),
        )
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => debug!(object = %obj, "Reconciled"),
                Err(e) => warn!("OriginIssuer controller error: {}", e),
            }
        });

    let cluster_issuer_controller =
        Controller::new(cluster_issuers, watcher::Config::default().any_semantic())
            .shutdown_on_signal()
            .run(
                reconcile_cluster_origin_issuer,
                |obj, error: &IssuerError, ctx| {
                    handle_reconciliation_error(
                        CLUSTER_ORIGIN_ISSUER_KIND,
                        &ObjectKey::from_resource(obj.as_ref()),
                        error,
                        error.is_retryable(),
                        &ctx,
                    )
                },
                Arc::clone(&ctx),
            )
            .for_each(|result| async move {
                match result {
                    Ok((obj, _)) => debug!(object = %obj, "Reconciled"),
                    Err(e) => warn!("ClusterOriginIssuer controller error: {}", e),
                }
            });

    let request_controller = Controller::new(requests, watcher::Config::default().any_semantic())
        .shutdown_on_signal()
        .run(
            reconcile_certificate_request,
            |obj, error: &CertificateRequestError, ctx| {
                handle_reconciliation_error(
                    CERTIFICATE_REQUEST_KIND,
                    &ObjectKey::from_resource(obj.as_ref()),
                    error,
                    error.is_retryable(),
                    &ctx,
                )
            },
            Arc::clone(&ctx),
        )
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => debug!(object = %obj, "Reconciled"),
                Err(e) => warn!("CertificateRequest controller error: {}", e),
            }
        });

    server_state.set_ready(true);
    futures::join!(issuer_controller, cluster_issuer_controller, request_controller);
    server_state.set_ready(false);

    info!("Controller watch loops stopped");
    Ok(())
}

async fn reconcile_origin_issuer(obj: Arc<OriginIssuer>, ctx: Arc<Context>) -> Result<Action, IssuerError> {
    let issuer = IssuerRef::namespaced(obj.namespace().unwrap_or_default(), obj.name_any());
    let key = issuer.key();
    observe(ORIGIN_ISSUER_KIND, &key, &ctx, ctx.reconciler.reconcile_issuer(&issuer)).await
}

async fn reconcile_cluster_origin_issuer(
    obj: Arc<ClusterOriginIssuer>,
    ctx: Arc<Context>,
) -> Result<Action, IssuerError> {
    let issuer = IssuerRef::cluster(obj.name_any());
    let key = issuer.key();
    observe(CLUSTER_ORIGIN_ISSUER_KIND, &key, &ctx, ctx.reconciler.reconcile_issuer(&issuer)).await
}

async fn reconcile_certificate_request(
    obj: Arc<CertificateRequest>,
    ctx: Arc<Context>,
) -> Result<Action, CertificateRequestError> {
    let key = ObjectKey::from_resource(obj.as_ref());
    observe(
        CERTIFICATE_REQUEST_KIND,
        &key,
        &ctx,
        ctx.reconciler.reconcile_certificate_request(&key),
    )
    .await
}

/// Record metrics for one reconciliation and reset backoff on success
async fn observe<F, E>(kind: &'static str, key: &ObjectKey, ctx: &Context, reconciliation: F) -> Result<Action, E>
where
    F: Future<Output = Result<Action, E>>,
{
    metrics::increment_reconciliations(kind);
    let started = Instant::now();
    let result = reconciliation.await;
    metrics::observe_reconciliation_duration(kind, started.elapsed().as_secs_f64());

    if result.is_ok() {
        ctx.backoff.reset(&backoff_key(kind, key));
    }
    result
}
