//! # Error Policy
//!
//! Requeue timing for failed reconciliations.
//!
//! Each object gets its own Fibonacci sequence so one failing issuer cannot
//! slow down retries of another. The sequence resets after a successful
//! reconciliation.

use super::Context;
use crate::cfapi::ApiError;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::store::ObjectKey;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fallback when the backoff table is unusable
const FALLBACK_BACKOFF_SECS: u64 = 60;

/// Per-object backoff table
#[derive(Debug)]
pub struct ErrorBackoff {
    min_secs: u64,
    max_secs: u64,
    states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl ErrorBackoff {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            max_secs,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Next retry delay for `key`, advancing its sequence
    pub fn next_delay(&self, key: &str) -> Duration {
        match self.states.lock() {
            Ok(mut states) => states
                .entry(key.to_string())
                .or_insert_with(|| FibonacciBackoff::new(self.min_secs, self.max_secs))
                .next_backoff(),
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using default backoff", e);
                Duration::from_secs(FALLBACK_BACKOFF_SECS)
            }
        }
    }

    /// Forget the sequence of `key`
    pub fn reset(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }
}

/// Key used in the backoff table
#[must_use]
pub fn backoff_key(kind: &str, key: &ObjectKey) -> String {
    format!("{kind}/{key}")
}

/// Requeue a failed reconciliation with Fibonacci backoff.
///
/// Errors that cannot succeed on retry (bad spec, missing secret key,
/// malformed CSR or response) are not requeued; the object is reconciled
/// again once it changes.
pub fn handle_reconciliation_error(
    kind: &'static str,
    key: &ObjectKey,
    error: &(dyn std::error::Error + 'static),
    retryable: bool,
    ctx: &Context,
) -> Action {
    match ApiError::find(error) {
        Some(api_error) => error!(
            kind,
            resource = %key,
            api.code = api_error.code,
            api.ray_id = %api_error.ray_id,
            "Reconciliation error: {}",
            error
        ),
        None => error!(kind, resource = %key, "Reconciliation error: {}", error),
    }
    metrics::increment_reconciliation_errors(kind);

    if !retryable {
        ctx.backoff.reset(&backoff_key(kind, key));
        info!(kind, resource = %key, "Error is not retryable, waiting for the resource to change");
        return Action::await_change();
    }

    let delay = ctx.backoff.next_delay(&backoff_key(kind, key));
    info!(
        kind,
        resource = %key,
        "Retrying with Fibonacci backoff: {}s (trigger source: error-backoff)",
        delay.as_secs()
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}
