//! # Runtime
//!
//! Wires the reconcilers into `kube-runtime` controllers.
//!
//! - `error_policy`: per-object Fibonacci backoff after failed reconciliations
//! - `watch_loop`: the three watch loops and their reconcile adapters

pub mod error_policy;
pub mod watch_loop;

use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use error_policy::ErrorBackoff;

/// State shared by every watch loop
#[derive(Debug)]
pub struct Context {
    pub reconciler: Reconciler,
    pub backoff: ErrorBackoff,
}

impl Context {
    #[must_use]
    pub fn new(reconciler: Reconciler, config: &ControllerConfig) -> Self {
        Self {
            reconciler,
            backoff: ErrorBackoff::new(config.backoff_min_secs, config.backoff_max_secs),
        }
    }
}
