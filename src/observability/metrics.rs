//! # Metrics
//!
//! Prometheus metrics for monitoring the issuer.
//!
//! ## Metrics Exposed
//!
//! - `origin_ca_issuer_reconciliations_total{kind}` - Reconciliations started
//! - `origin_ca_issuer_reconciliation_errors_total{kind}` - Reconciliations that returned an error
//! - `origin_ca_issuer_reconciliation_duration_seconds{kind}` - Duration of reconciliations
//! - `origin_ca_issuer_requeues_total{reason}` - Requeues scheduled by the error policy
//! - `origin_ca_issuer_sign_requests_total{outcome}` - Calls to the Origin CA signing API
//! - `origin_ca_issuer_sign_duration_seconds` - Duration of signing calls

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "origin_ca_issuer_reconciliations_total",
            "Total number of reconciliations by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "origin_ca_issuer_reconciliation_errors_total",
            "Total number of reconciliation errors by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "origin_ca_issuer_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds by resource kind",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "origin_ca_issuer_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static SIGN_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "origin_ca_issuer_sign_requests_total",
            "Total number of Origin CA signing requests by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create SIGN_REQUESTS_TOTAL metric - this should never happen")
});

static SIGN_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "origin_ca_issuer_sign_duration_seconds",
            "Duration of Origin CA signing requests in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create SIGN_DURATION metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Only fails when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SIGN_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SIGN_DURATION.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION.with_label_values(&[kind]).observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

/// `outcome` is `success` or `error`
pub fn increment_sign_requests(outcome: &str) {
    SIGN_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn observe_sign_duration(duration: f64) {
    SIGN_DURATION.observe(duration);
}
