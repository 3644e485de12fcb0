//! JSON Web Keys, restricted to the RSA public keys an issuer publishes
//! through its JWKS endpoint
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][].
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use std::convert::TryFrom;

use aliri_braid::braid;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::{error, jwa::Algorithm};

/// An identifier for a key within a key set
#[braid(serde, ref_doc = "A borrowed reference to a key identifier ([`KeyId`])")]
pub struct KeyId;

/// The intended usage of a key, from the JWK `use` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Usage {
    /// The key is used for verifying signatures
    #[serde(rename = "sig")]
    Signing,

    /// The key is used for encryption
    #[serde(rename = "enc")]
    Encryption,
}

/// A public signing key published by the issuer
///
/// Immutable once parsed. Keys whose declared usage or algorithm is
/// incompatible with signature verification still deserialize, but
/// [`can_verify`][Jwk::can_verify] reports them unusable.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "JwkDto")]
#[must_use]
pub struct Jwk {
    key_id: Option<KeyId>,
    usage: Option<Usage>,
    algorithm: Option<Algorithm>,
    key: RsaPublicKey,
}

impl Jwk {
    /// Wraps a bare public key with no declared id, usage, or algorithm
    pub fn new(key: RsaPublicKey) -> Self {
        Self {
            key_id: None,
            usage: None,
            algorithm: None,
            key,
        }
    }

    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The declared usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    /// The algorithm the key is restricted to, if any
    #[must_use]
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            key_id: Some(kid.into()),
            ..self
        }
    }

    /// Restricts the key to a single algorithm
    pub fn with_algorithm(self, alg: Algorithm) -> Self {
        Self {
            algorithm: Some(alg),
            ..self
        }
    }

    /// Sets the key's declared usage
    pub fn with_usage(self, usage: Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Whether this key may verify signatures produced with `alg`
    ///
    /// A key declared for encryption never verifies; a key declared for a
    /// specific algorithm verifies only that algorithm; an unrestricted key
    /// verifies any supported algorithm.
    #[must_use]
    pub fn can_verify(&self, alg: Algorithm) -> bool {
        if matches!(self.usage, Some(Usage::Encryption)) {
            return false;
        }

        match self.algorithm {
            Some(key_alg) => key_alg == alg,
            None => true,
        }
    }

    /// Verifies `signature` over `data` using `alg`
    ///
    /// # Errors
    ///
    /// Returns an error if the signature does not match.
    pub fn verify(
        &self,
        alg: Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::SignatureMismatch> {
        self.key.verify(alg, data, signature)
    }
}

/// RSA public key components
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaPublicKey {
    modulus: Vec<u8>,
    exponent: Vec<u8>,
}

impl RsaPublicKey {
    /// Constructs a key from raw big-endian modulus and exponent bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the modulus is shorter than 2048 bits.
    pub fn from_components(
        modulus: Vec<u8>,
        exponent: Vec<u8>,
    ) -> Result<Self, error::KeyRejected> {
        if modulus.len() < 256 {
            return Err(error::key_rejected("key modulus must be at least 2048 bits"));
        }

        Ok(Self { modulus, exponent })
    }

    fn verify(
        &self,
        alg: Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::SignatureMismatch> {
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.verification_params(), data, signature)
            .map_err(|_| error::SignatureMismatch)
    }
}

impl TryFrom<JwkDto> for Jwk {
    type Error = error::KeyRejected;

    fn try_from(dto: JwkDto) -> Result<Self, Self::Error> {
        if dto.kty != "RSA" {
            return Err(error::key_rejected(format!(
                "unsupported key type '{}'",
                dto.kty
            )));
        }

        let modulus = URL_SAFE_NO_PAD
            .decode(dto.modulus)
            .map_err(error::key_rejected)?;
        let exponent = URL_SAFE_NO_PAD
            .decode(dto.exponent)
            .map_err(error::key_rejected)?;

        Ok(Self {
            key_id: dto.key_id,
            usage: dto.usage,
            algorithm: dto.algorithm,
            key: RsaPublicKey::from_components(modulus, exponent)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct JwkDto {
    #[serde(rename = "kid", default)]
    key_id: Option<KeyId>,

    kty: String,

    #[serde(rename = "use", default)]
    usage: Option<Usage>,

    #[serde(rename = "alg", default)]
    algorithm: Option<Algorithm>,

    #[serde(rename = "n")]
    modulus: String,

    #[serde(rename = "e")]
    exponent: String,
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::test_util;

    #[test]
    fn decodes_rsa_signing_jwk() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(test_util::JWK)?;
        assert_eq!(
            jwk.key_id().map(KeyIdRef::as_str),
            Some(test_util::TEST_KEY_ID)
        );
        assert_eq!(jwk.usage(), Some(Usage::Signing));
        assert!(jwk.can_verify(Algorithm::RS256));
        assert!(jwk.can_verify(Algorithm::PS256));
        Ok(())
    }

    #[test]
    fn rejects_non_rsa_key_types() {
        const EC_JWK: &str = r#"{
            "kid": "ec-key",
            "kty": "EC",
            "crv": "P-256",
            "n": "AQAB",
            "e": "AQAB"
        }"#;

        let result = serde_json::from_str::<Jwk>(EC_JWK);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_undecodable_components() {
        const BAD_JWK: &str = r#"{
            "kid": "bad",
            "kty": "RSA",
            "n": "@@not-base64@@",
            "e": "AQAB"
        }"#;

        let result = serde_json::from_str::<Jwk>(BAD_JWK);
        assert!(result.is_err());
    }

    #[test]
    fn algorithm_restriction_limits_verification() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(test_util::JWK)?;
        let restricted = jwk.with_algorithm(Algorithm::RS256);
        assert!(restricted.can_verify(Algorithm::RS256));
        assert!(!restricted.can_verify(Algorithm::PS256));
        Ok(())
    }

    #[test]
    fn encryption_keys_never_verify() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(test_util::JWK)?;
        let enc = jwk.with_usage(Usage::Encryption);
        assert!(!enc.can_verify(Algorithm::RS256));
        Ok(())
    }
}
