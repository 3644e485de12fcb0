//! Key acquisition and bearer-token verification for the tokengate
//! gatekeeper
//!
//! Two pieces compose here:
//!
//! * [`KeyStore`] — the issuer's published signing keys, fetched from the
//!   JWKS endpoint, cached with a bounded time-to-live, and replaced by
//!   atomic pointer swap so concurrent verifications never observe a
//!   partially built key set.
//! * [`Verifier`] — the ordered verification pipeline that turns the raw
//!   value of an `Authorization` header into either a
//!   [`Verified`][tokengate::jwt::Verified] token or a [`VerifyError`]
//!   reason code.
//!
//! Everything here is request-scoped except the key cache, which is the
//! single piece of shared mutable state in the service.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod keystore;
mod verifier;

pub use keystore::{FetchError, KeyStore};
pub use verifier::{Verifier, VerifyError};
