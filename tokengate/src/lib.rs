//! Verification-only implementations of the JOSE standards used by the
//! tokengate gatekeeper:
//!
//! * JSON Web Key (JWK): [RFC7517][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//! * JWT profile for OAuth 2.0 access tokens: [RFC9068][]
//!
//! Nothing in this crate performs I/O and nothing in it can mint a token:
//! the only supported operation is deciding whether a presented token was
//! signed by one of the issuer's published RSA keys and carries acceptable
//! claims. Symmetric algorithms and the `none` algorithm are not
//! representable here, which closes the classic `alg:none` downgrade at the
//! type level.
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//! [RFC9068]: https://tools.ietf.org/html/rfc9068
//!
//! # Example
//!
//! ```
//! use tokengate::{jwt, JwtRef, KeySet};
//!
//! let token = JwtRef::from_str(concat!(
//!     "eyJhbGciOiJSUzI1NiIsImtpZCI6Im01VXNpa1NIeXQiLCJ0eXAiOiJKV1QifQ.",
//!     "eyJpc3MiOiJodHRwczovL2lkcC5leGFtcGxlLmNvbS8iLCJhdWQiOiJteS1hcGkiLCJz",
//!     "dWIiOiJ1MSIsImV4cCI6MzMyMDg5MTc2MDB9.",
//!     "S75srAD8JfoitExLP9Hy5aY3sqEHZstpKS8gu5qwda6wHMTQQ1XzVll1O0GTo1f9vX5z",
//!     "mF7Kf6fLyMOPf7HSyHM5Y_IEdJrrNK3vaQI_32WZvBldBerBAMCvzb8lb7vjylJ8s8Hh",
//!     "irv45OY1vY0amiY4OcScLYCf9tJ3O9Vh3Yi4_imAGza9JTvQYuMVO2x01aXZyR0FrIkw",
//!     "k0ESNfOEuN5atXCfQqSlmxKRfxY8zro0bg_2Js23BvF4q3LtqMXn2-hMnTm1kFK1mxbk",
//!     "DK1zKben3ucpfu3BcyTFz991AOuEfMwZzBEmiHii8RRWfnuhffX0nl88ZPCriXClk9Uk",
//!     "2w",
//! ));
//!
//! let keys: KeySet = serde_json::from_str(r#"{
//!     "keys": [{
//!         "kid": "m5UsikSHyt",
//!         "kty": "RSA",
//!         "use": "sig",
//!         "n": "pWfNTiqWIZBHs0yqzeo174TzuZh2AR_wil2FEBVw5KeI2iF1JUxvDR02twAuDFsdXPaMj9MczvxadR-RcikEAQTEgSh0JbaG_AYHgCpc1e3MlF3yPY5O_mggShiyxF3V_T0Q3NxG57q_TumLP9zkuCAhHJnYrHRofVQeCjqSy_wNKJRJYvBSx_-bFA__aRgerrF0S4I-VgS7BIXlldjtQ2UsXC__nDdVuUHsY8gQS4jOZ1kRosY8ShX8w32r0BKMO5-Mb7zS8XMfBW-Iow-SUfUbEynP1oOWrmjRv_eosHVO6bT_x_PkePBp9RqsxGzts-qVBbXZnKCDHDqrwpdcZQ",
//!         "e": "AQAB"
//!     }]
//! }"#).unwrap();
//!
//! let validation = jwt::Validation::new("https://idp.example.com/", "my-api");
//!
//! let decomposed = token.decompose().unwrap();
//! let alg = validation.screen(decomposed.untrusted_header()).unwrap();
//! let key = decomposed
//!     .kid()
//!     .and_then(|kid| keys.get(kid, alg))
//!     .expect("no usable key for the token");
//!
//! let verified = decomposed.verify(key, alg, &validation).unwrap();
//! assert_eq!(verified.subject().unwrap().as_str(), "u1");
//! ```

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

pub mod clock;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jwt;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::KeySet;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef};
