//! The signing algorithms this crate will verify
//!
//! Only the asymmetric RSA families from [RFC7518][] are representable:
//! RSASSA-PKCS1-v1_5 (`RS*`) and RSASSA-PSS (`PS*`). Symmetric and
//! unsigned declarations fail to parse into an [`Algorithm`] and are
//! reported through [`error::UnknownAlgorithm`].
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error;

/// An asymmetric signing algorithm usable for token verification
///
/// This list may be expanded in the future.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// RSASSA-PSS using SHA-256
    PS256,
    /// RSASSA-PSS using SHA-384
    PS384,
    /// RSASSA-PSS using SHA-512
    PS512,
}

impl Algorithm {
    pub(crate) fn verification_params(self) -> &'static ring::signature::RsaParameters {
        match self {
            Algorithm::RS256 => &ring::signature::RSA_PKCS1_2048_8192_SHA256,
            Algorithm::RS384 => &ring::signature::RSA_PKCS1_2048_8192_SHA384,
            Algorithm::RS512 => &ring::signature::RSA_PKCS1_2048_8192_SHA512,
            Algorithm::PS256 => &ring::signature::RSA_PSS_2048_8192_SHA256,
            Algorithm::PS384 => &ring::signature::RSA_PSS_2048_8192_SHA384,
            Algorithm::PS512 => &ring::signature::RSA_PSS_2048_8192_SHA512,
        }
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnknownAlgorithm;

    #[inline]
    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        match value {
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            "PS256" => Ok(Algorithm::PS256),
            "PS384" => Ok(Algorithm::PS384),
            "PS512" => Ok(Algorithm::PS512),
            _ => Err(error::unknown_algorithm(value.to_string())),
        }
    }
}

impl FromStr for Algorithm {
    type Err = error::UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
        };

        f.write_str(s)
    }
}
