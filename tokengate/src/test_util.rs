//! Token-minting helpers for tests
//!
//! This module embeds a fixed RSA-2048 key pair and signs tokens at test
//! runtime, so no fixture ever carries a precomputed signature. It is
//! compiled only for this crate's own tests and, behind the `test-util`
//! feature, for the tests of the other workspace crates. None of this is
//! part of the service: the service can verify tokens, never produce them.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::SystemRandom;
use ring::signature::RsaKeyPair;

use crate::clock::{Clock, System};
use crate::jwa::Algorithm;
use crate::{Jwt, KeySet};

/// Key identifier used by all test fixtures
pub const TEST_KEY_ID: &str = "m5UsikSHyt";

/// Issuer used by test tokens
pub const TEST_ISSUER: &str = "https://idp.example.com/";

/// Audience used by test tokens
pub const TEST_AUDIENCE: &str = "api-x";

/// The test RSA-2048 key pair, PKCS#1 DER
pub const PRIVATE_KEY_DER: &[u8] = include_bytes!("../data/test-rsa.der");

/// The public half of the test key as a single JWK
pub const JWK: &str = include_str!("../data/jwk.json");

/// A JWKS document publishing the test key
pub const JWKS: &str = include_str!("../data/jwks.json");

/// A JWKS document mixing the test key with entries a verifier cannot use
pub const JWKS_WITH_UNUSABLE_KEYS: &str = include_str!("../data/jwks-mixed.json");

/// The test key pair, ready to sign
pub fn key_pair() -> RsaKeyPair {
    RsaKeyPair::from_der(PRIVATE_KEY_DER).expect("embedded test key is valid")
}

/// The key set published for the test key
pub fn key_set() -> KeySet {
    serde_json::from_str(JWKS).expect("embedded test JWKS is valid")
}

/// The test key's public JWK
pub fn test_jwk() -> crate::Jwk {
    serde_json::from_str(JWK).expect("embedded test JWK is valid")
}

/// Header JSON declaring `alg`, the test key id, and the `JWT` type
pub fn header_json(alg: Algorithm) -> String {
    format!(r#"{{"alg":"{alg}","kid":"{TEST_KEY_ID}","typ":"JWT"}}"#)
}

/// Claims JSON for subject `u1`, expiring `exp_offset` seconds from now
pub fn claims_json(issuer: &str, audience: &str, exp_offset: i64) -> String {
    let now = System.now().0 as i64;
    format!(
        concat!(
            r#"{{"iss":"{issuer}","aud":["{audience}"],"sub":"u1","#,
            r#""email":"u1@example.com","exp":{exp},"iat":{now}}}"#,
        ),
        issuer = issuer,
        audience = audience,
        exp = now + exp_offset,
        now = now,
    )
}

/// Signs `header_json` and `claims_json` with the test key using `alg`
pub fn sign_token(alg: Algorithm, header_json: &str, claims_json: &str) -> Jwt {
    let message = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json),
    );

    let params: &dyn ring::signature::RsaEncoding = match alg {
        Algorithm::RS256 => &ring::signature::RSA_PKCS1_SHA256,
        Algorithm::RS384 => &ring::signature::RSA_PKCS1_SHA384,
        Algorithm::RS512 => &ring::signature::RSA_PKCS1_SHA512,
        Algorithm::PS256 => &ring::signature::RSA_PSS_SHA256,
        Algorithm::PS384 => &ring::signature::RSA_PSS_SHA384,
        Algorithm::PS512 => &ring::signature::RSA_PSS_SHA512,
    };

    let pair = key_pair();
    let mut signature = vec![0; pair.public().modulus_len()];
    pair.sign(
        params,
        &SystemRandom::new(),
        message.as_bytes(),
        &mut signature,
    )
    .expect("signing with the embedded test key succeeds");

    Jwt::new(format!("{message}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// A well-formed token signed by the test key
pub fn signed_token(alg: Algorithm, issuer: &str, audience: &str, exp_offset: i64) -> Jwt {
    sign_token(alg, &header_json(alg), &claims_json(issuer, audience, exp_offset))
}

/// A structurally valid token whose signature segment is all zero bytes
///
/// Useful for exercising checks that must fire before signature
/// verification is ever attempted.
pub fn unsigned_token(header_json: &str, claims_json: &str) -> Jwt {
    let message = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json),
    );
    Jwt::new(format!("{message}.{}", URL_SAFE_NO_PAD.encode([0u8; 256])))
}

/// Flips one character inside the token's signature segment
pub fn tamper_signature(token: &Jwt) -> Jwt {
    let raw = token.as_str();
    let last_period = raw.rfind('.').expect("signed tokens have three segments");

    // A character well inside the segment, so every one of its bits is
    // signature data rather than base64 trailing padding.
    let index = last_period + 11;
    let mut bytes = raw.as_bytes().to_vec();
    bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };

    Jwt::new(String::from_utf8(bytes).expect("tampering preserves UTF-8"))
}
