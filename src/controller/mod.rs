//! # Controller
//!
//! Core controller modules for the Origin CA issuer.
//!
//! - `backoff`: Fibonacci backoff used by the runtime error policy
//! - `conditions`: Status condition bookkeeping
//! - `credentials`: Resolution of issuer credentials from secrets
//! - `csr`: Hostname extraction from certificate signing requests
//! - `duration`: Go-style duration parsing for requested validity
//! - `reconciler`: Issuer and CertificateRequest reconciliation
//! - `store`: Resource and secret store seams plus the Kubernetes implementation

pub mod backoff;
pub mod conditions;
pub mod credentials;
pub mod csr;
pub mod duration;
pub mod reconciler;
pub mod store;
