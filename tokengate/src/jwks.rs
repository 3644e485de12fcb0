use serde::Deserialize;

use crate::{jwa::Algorithm, jwk, Jwk};

/// The set of signing keys published by the trusted issuer
///
/// Entries that are not usable RSA signing keys (unknown key types,
/// unsupported algorithms, undecodable material) are dropped during
/// deserialization with a warning rather than failing the whole set; key
/// rotation must not be blocked by the issuer publishing a key this
/// service cannot use.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct KeySet {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<Jwk>,
}

impl KeySet {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// A view of the keys in this set
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Whether the set holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Gets the key identified by `kid`, provided it can verify `alg`
    #[must_use]
    pub fn get(&self, kid: &jwk::KeyIdRef, alg: Algorithm) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|key| key.key_id() == Some(kid) && key.can_verify(alg))
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeJwk {
        Jwk(Jwk),
        Unknown(UnusableKey),
    }

    #[allow(dead_code)]
    #[derive(Deserialize)]
    struct UnusableKey {
        #[serde(default)]
        kid: Option<jwk::KeyId>,
        #[serde(default)]
        kty: Option<String>,
        #[serde(default)]
        alg: Option<String>,
    }

    let candidates = Vec::<MaybeJwk>::deserialize(deserializer)?;
    let mut keys = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.into_iter().enumerate() {
        match candidate {
            MaybeJwk::Jwk(jwk) => keys.push(jwk),
            MaybeJwk::Unknown(key) => {
                tracing::warn!(
                    jwks.idx = index,
                    jwk.kid = ?key.kid,
                    jwk.kty = ?key.kty,
                    jwk.alg = ?key.alg,
                    "ignoring unusable JWK"
                );
            }
        }
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::jwk::KeyIdRef;
    use crate::test_util;

    const JWKS_WITH_UNKNOWN_ALG: &str = r#"
        {
            "keys": [
                {
                    "kid": "1",
                    "use": "enc",
                    "alg": "RSA-OAEP"
                }
            ]
        }
    "#;

    const JWKS_WITH_NOTHING: &str = r#"
        {
            "keys": [
                {}
            ]
        }
    "#;

    #[test]
    fn deserializes_jwks_with_unknown_alg() -> Result<()> {
        let jwks: KeySet = serde_json::from_str(JWKS_WITH_UNKNOWN_ALG)?;
        assert!(jwks.is_empty());
        Ok(())
    }

    #[test]
    fn deserializes_jwks_with_nothing() -> Result<()> {
        let jwks: KeySet = serde_json::from_str(JWKS_WITH_NOTHING)?;
        assert!(jwks.is_empty());
        Ok(())
    }

    #[test]
    fn decodes_jwks() -> Result<()> {
        let jwks: KeySet = serde_json::from_str(test_util::JWKS)?;
        assert_eq!(jwks.keys().len(), 1);
        Ok(())
    }

    #[test]
    fn keeps_only_usable_keys_from_mixed_set() -> Result<()> {
        let jwks: KeySet = serde_json::from_str(test_util::JWKS_WITH_UNUSABLE_KEYS)?;
        assert_eq!(jwks.keys().len(), 1);
        assert_eq!(
            jwks.keys()[0].key_id().map(KeyIdRef::as_str),
            Some(test_util::TEST_KEY_ID)
        );
        Ok(())
    }

    #[test]
    fn gets_key_by_id() -> Result<()> {
        let jwks: KeySet = serde_json::from_str(test_util::JWKS)?;
        let kid = KeyIdRef::from_str(test_util::TEST_KEY_ID);
        assert!(jwks.get(kid, crate::jwa::Algorithm::RS256).is_some());
        assert!(jwks.get(kid, crate::jwa::Algorithm::PS256).is_some());
        assert!(jwks
            .get(KeyIdRef::from_str("unknown"), crate::jwa::Algorithm::RS256)
            .is_none());
        Ok(())
    }

    #[test]
    fn algorithm_restricted_key_is_not_served_for_other_algorithms() -> Result<()> {
        let mut jwks = KeySet::default();
        let restricted = test_util::test_jwk().with_algorithm(crate::jwa::Algorithm::RS256);
        jwks.add_key(restricted);

        let kid = KeyIdRef::from_str(test_util::TEST_KEY_ID);
        assert!(jwks.get(kid, crate::jwa::Algorithm::RS256).is_some());
        assert!(jwks.get(kid, crate::jwa::Algorithm::PS256).is_none());
        Ok(())
    }
}
