use thiserror::Error;
use tokengate::error::{
    ClaimsRejected, HeaderRejected, MalformedJwt, SignatureMismatch, TokenRejected,
};
use tokengate::jwt::{Validation, Verified};
use tokengate::JwtRef;

use crate::KeyStore;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a presented credential was rejected
///
/// These reasons feed diagnostic logs and test assertions only. The HTTP
/// boundary maps every one of them to an undifferentiated `401`; echoing
/// the distinction to the caller would hand an attacker an oracle over the
/// validation logic.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No token was presented, or the header did not carry a bearer
    /// credential
    #[error("no bearer token presented")]
    MissingToken,

    /// The token could not be decomposed into header, claims, and signature
    #[error("malformed token")]
    Malformed(#[from] MalformedJwt),

    /// The token declared a type or algorithm this service does not accept
    #[error("token type or algorithm not accepted")]
    UnsupportedAlgorithmOrType(#[source] HeaderRejected),

    /// No key in the current key set matches the token, even after a
    /// refresh
    #[error("no key matches the token's key id")]
    UnknownKey,

    /// The token's signature did not verify against the resolved key
    #[error("token signature verification failed")]
    BadSignature(#[source] SignatureMismatch),

    /// The token is expired
    #[error("token is expired")]
    Expired,

    /// The token was issued by an untrusted issuer
    #[error("token issuer is not trusted")]
    WrongIssuer,

    /// The token was not issued for this service's audience
    #[error("token audience does not include this service")]
    WrongAudience,
}

impl VerifyError {
    /// A stable snake_case label for use as a log field
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Malformed(_) => "malformed",
            Self::UnsupportedAlgorithmOrType(_) => "unsupported_algorithm_or_type",
            Self::UnknownKey => "unknown_key",
            Self::BadSignature(_) => "bad_signature",
            Self::Expired => "expired",
            Self::WrongIssuer => "wrong_issuer",
            Self::WrongAudience => "wrong_audience",
        }
    }
}

impl From<TokenRejected> for VerifyError {
    fn from(err: TokenRejected) -> Self {
        match err {
            TokenRejected::Signature(err) => Self::BadSignature(err),
            TokenRejected::Claims(claims) => match claims {
                ClaimsRejected::Expired | ClaimsRejected::MissingRequiredClaim("exp") => {
                    Self::Expired
                }
                ClaimsRejected::InvalidIssuer | ClaimsRejected::MissingRequiredClaim("iss") => {
                    Self::WrongIssuer
                }
                ClaimsRejected::InvalidAudience | ClaimsRejected::MissingRequiredClaim(_) => {
                    Self::WrongAudience
                }
            },
        }
    }
}

/// The bearer-token verification pipeline
///
/// Stateless apart from the shared [`KeyStore`]. The pipeline order is
/// fixed: presence, structural parse, type/algorithm gate, key resolution,
/// signature verification, and only then the claim chain — cheap checks
/// before cryptography, cryptography before any claim is trusted.
///
/// Cloning is cheap; clones share the key store.
#[derive(Clone, Debug)]
pub struct Verifier {
    keys: KeyStore,
    validation: Validation,
}

impl Verifier {
    /// Composes the pipeline from a key store and a validation plan
    pub fn new(keys: KeyStore, validation: Validation) -> Self {
        Self { keys, validation }
    }

    /// The key store backing this verifier
    #[must_use]
    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    /// Verifies the raw value of an `Authorization` header
    ///
    /// An absent header, an empty value, or a non-`Bearer` scheme
    /// short-circuits to [`VerifyError::MissingToken`] without any parsing.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when the credential fails any pipeline
    /// step.
    pub async fn verify_header(
        &self,
        authorization: Option<&str>,
    ) -> Result<Verified, VerifyError> {
        let token = authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .filter(|token| !token.is_empty())
            .ok_or(VerifyError::MissingToken)?;

        self.verify(JwtRef::from_str(token)).await
    }

    /// Runs the verification pipeline over a bearer token
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when the token fails any pipeline step.
    pub async fn verify(&self, token: &JwtRef) -> Result<Verified, VerifyError> {
        let decomposed = token.decompose()?;

        let alg = self
            .validation
            .screen(decomposed.untrusted_header())
            .map_err(VerifyError::UnsupportedAlgorithmOrType)?;

        let kid = decomposed.kid().ok_or(VerifyError::UnknownKey)?;
        let key = self
            .keys
            .lookup(kid, alg)
            .await
            .ok_or(VerifyError::UnknownKey)?;

        let verified = decomposed.verify(&key, alg, &self.validation)?;

        Ok(verified)
    }
}
