//! HTTP boundary for the tokengate verification pipeline
//!
//! This crate owns everything a reverse proxy can observe: the
//! `/auth/validate` route consulted through `auth_request`, the liveness
//! probe, and the startup configuration surface. The decision itself is
//! delegated wholesale to [`tokengate_authority::Verifier`]; nothing here
//! inspects a token.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod config;
pub mod http;
