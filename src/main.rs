//! # Origin CA Issuer
//!
//! cert-manager external issuer for the Cloudflare Origin CA.
//!
//! Watches `OriginIssuer`, `ClusterOriginIssuer` and cert-manager
//! `CertificateRequest` resources across all namespaces. Issuers are checked
//! for a readable credential; requests referencing a ready issuer are signed
//! through the Origin CA API and the certificate is written back to the
//! request's status.

use anyhow::{Context as _, Result};
use kube::Client;
use origin_ca_issuer::config::ControllerConfig;
use origin_ca_issuer::controller::reconciler::Reconciler;
use origin_ca_issuer::controller::store::KubeStore;
use origin_ca_issuer::observability::{self, logging::LogFormat};
use origin_ca_issuer::runtime::{watch_loop::run_watch_loop, Context};
use origin_ca_issuer::server::{start_server, ServerState};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before any TLS connection is made.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_provider| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = ControllerConfig::from_env();
    observability::logging::init_tracing(&config.log_level, LogFormat::parse(&config.log_format))?;

    info!("Starting Origin CA Issuer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        cluster_resource_namespace = %config.cluster_resource_namespace,
        api_endpoint = %config.api_endpoint,
        "Loaded configuration"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let store = Arc::new(KubeStore::new(client.clone()));
    let reconciler = Reconciler::from_config(Arc::<KubeStore>::clone(&store), store, &config);
    let ctx = Arc::new(Context::new(reconciler, &config));

    run_watch_loop(client, ctx, server_state).await?;

    info!("Origin CA Issuer stopped");
    Ok(())
}
