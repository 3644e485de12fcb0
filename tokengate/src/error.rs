//! Errors produced while decoding and verifying tokens

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

/// The token cannot be split and decoded into header, claims, and signature
#[derive(Debug, Error)]
pub enum MalformedJwt {
    /// The token is not a three-segment JWS compact serialization
    #[error("token is not a three-part JWS compact serialization")]
    Structure,

    /// The header segment could not be decoded
    #[error("malformed token header")]
    Header(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// The claims segment could not be decoded
    #[error("malformed token claims")]
    Claims(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// The signature segment could not be decoded
    #[error("malformed token signature")]
    Signature(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

pub(crate) fn malformed_header(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwt {
    MalformedJwt::Header(source.into())
}

pub(crate) fn malformed_claims(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwt {
    MalformedJwt::Claims(source.into())
}

pub(crate) fn malformed_signature(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwt {
    MalformedJwt::Signature(source.into())
}

/// The declared name does not match any supported signing algorithm
///
/// Symmetric names (`HS256`, …) and `none` land here as well: they are not
/// merely unapproved, they do not exist as far as this crate is concerned.
#[derive(Debug, Error)]
#[error("'{alg}' does not match supported algorithms")]
pub struct UnknownAlgorithm {
    pub(crate) alg: String,
}

impl UnknownAlgorithm {
    /// The rejected algorithm name
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.alg
    }
}

pub(crate) fn unknown_algorithm(alg: String) -> UnknownAlgorithm {
    UnknownAlgorithm { alg }
}

/// The token's header failed the type/algorithm gate
#[derive(Debug, Error)]
pub enum HeaderRejected {
    /// The declared algorithm is not a supported asymmetric algorithm
    #[error(transparent)]
    Algorithm(#[from] UnknownAlgorithm),

    /// The declared algorithm is supported but not approved for this service
    #[error("algorithm '{0}' is not approved for verification")]
    UnapprovedAlgorithm(crate::jwa::Algorithm),

    /// The declared token type is not acceptable
    #[error("token type '{0}' is not acceptable")]
    UnacceptableType(String),
}

/// The key's material could not be used
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn key_rejected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// The signature does not match the token's signing input
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch;

/// The claims failed validation after the signature proved authentic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ClaimsRejected {
    /// The token is expired according to the `exp` claim
    #[error("token expired")]
    Expired,

    /// The token's issuer is not the trusted issuer
    #[error("invalid issuer")]
    InvalidIssuer,

    /// None of the token's audiences matches the expected audience
    #[error("invalid audience")]
    InvalidAudience,

    /// A claim the validation plan requires is absent
    #[error("required {_0} claim missing")]
    MissingRequiredClaim(&'static str),
}

/// A decomposed token failed verification
#[derive(Debug, Error)]
pub enum TokenRejected {
    /// The signature did not verify against the selected key
    #[error(transparent)]
    Signature(#[from] SignatureMismatch),

    /// The signature verified, but the claims were unacceptable
    #[error(transparent)]
    Claims(#[from] ClaimsRejected),
}
