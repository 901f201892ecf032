// src/validator/signature.rs

use super::claims::Claims;
use super::jwt::CompactJwt;
use crate::base64url;
use crate::error::{OidcError, Result};
use crate::key::to_public_key;
use crate::model::{Jwk, JwkSet};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde_json::Value;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use tracing::debug;

/// The RSASSA-PKCS1-v1_5 algorithms accepted in the `alg` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    RS256,
    RS384,
    RS512,
}

impl SigningAlgorithm {
    /// Maps the `alg` header. A header without `alg` is read as RS256.
    pub fn from_header(alg: Option<&str>) -> Result<Self> {
        match alg.unwrap_or("RS256") {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            other => Err(OidcError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    fn verify(self, key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> rsa::Result<()> {
        match self {
            Self::RS256 => key.verify(
                Pkcs1v15Sign::new::<Sha256>(),
                &Sha256::digest(message),
                signature,
            ),
            Self::RS384 => key.verify(
                Pkcs1v15Sign::new::<Sha384>(),
                &Sha384::digest(message),
                signature,
            ),
            Self::RS512 => key.verify(
                Pkcs1v15Sign::new::<Sha512>(),
                &Sha512::digest(message),
                signature,
            ),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Picks the verification key for a token.
///
/// With a `kid` header only the key carrying that `kid` is eligible. Without
/// one, the first RSA key whose `use` is absent or `sig` is taken. That
/// fallback trusts the provider to publish a single active signing key.
pub fn select_key<'a>(jwt: &CompactJwt, keys: &'a JwkSet) -> Result<&'a Jwk> {
    match jwt.kid() {
        Some(kid) => keys
            .find(kid)
            .ok_or_else(|| OidcError::KeyNotFound(format!("no key with kid '{kid}'"))),
        None => keys
            .first_rsa_signing_key()
            .ok_or_else(|| OidcError::KeyNotFound("no RSA signing key in key set".to_string())),
    }
}

/// Verifies the token's signature against the key set and returns its payload.
///
/// Claims are not inspected here; see [`super::claims::validate`].
pub fn verify(jwt: &CompactJwt, keys: &JwkSet) -> Result<Claims> {
    let jwk = select_key(jwt, keys)?;
    let algorithm = SigningAlgorithm::from_header(jwt.alg())?;
    let public_key = to_public_key(jwk)?.to_rsa()?;

    let signature = base64url::decode(&jwt.signature)
        .map_err(|e| OidcError::SignatureVerification(format!("signature is not base64url: {e}")))?;

    algorithm
        .verify(&public_key, jwt.signed_data.as_bytes(), &signature)
        .map_err(|e| OidcError::SignatureVerification(e.to_string()))?;

    debug!(kid = ?jwk.kid, %algorithm, "JWT signature verified");

    serde_json::from_value(Value::Object(jwt.payload.clone()))
        .map_err(|e| OidcError::MalformedToken(format!("unexpected claim types: {e}")))
}
