//! Origin CA Issuer Library
//!
//! A cert-manager external issuer that signs `CertificateRequest`s with the
//! Cloudflare Origin CA API.
//!
//! ## Quick Start
//!
//! ```rust
//! use origin_ca_issuer::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific
//! imports, use the individual modules.

pub mod cfapi;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
