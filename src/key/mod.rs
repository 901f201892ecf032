// src/key/mod.rs

//! Conversion of an RSA JSON Web Key into a SubjectPublicKeyInfo.
//!
//! The DER is assembled by hand from the JWK's `n` and `e`:
//!
//! ```text
//! SEQUENCE {                         -- SubjectPublicKeyInfo
//!   SEQUENCE { rsaEncryption, NULL } -- AlgorithmIdentifier
//!   BIT STRING {
//!     SEQUENCE { INTEGER n, INTEGER e } -- RSAPublicKey
//!   }
//! }
//! ```

pub mod der;

use crate::base64url;
use crate::error::{OidcError, Result};
use crate::model::Jwk;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use der::{DerNode, RSA_ALGORITHM_IDENTIFIER};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;

const PEM_LINE_WIDTH: usize = 64;

/// A DER-encoded SubjectPublicKeyInfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    der: Vec<u8>,
}

impl PublicKey {
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    /// PEM framing of the DER, wrapped at 64 columns.
    pub fn to_pem(&self) -> String {
        let body = STANDARD.encode(&self.der);
        let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
        pem.push_str("-----BEGIN PUBLIC KEY-----\n");
        for (i, c) in body.chars().enumerate() {
            if i > 0 && i % PEM_LINE_WIDTH == 0 {
                pem.push('\n');
            }
            pem.push(c);
        }
        pem.push_str("\n-----END PUBLIC KEY-----\n");
        pem
    }

    /// Hands the DER to the `rsa` crate, which performs the actual
    /// signature arithmetic.
    pub fn to_rsa(&self) -> Result<RsaPublicKey> {
        RsaPublicKey::from_public_key_der(&self.der)
            .map_err(|e| OidcError::InvalidKeyFormat(format!("unusable RSA public key: {e}")))
    }
}

/// Builds the public key for an RSA JWK.
///
/// # Errors
///
/// `UnsupportedKeyType` when `kty` is not `RSA`; `InvalidKeyFormat` when `n`
/// or `e` is missing, not base64url, or zero-length once decoded.
pub fn to_public_key(jwk: &Jwk) -> Result<PublicKey> {
    if !jwk.is_rsa() {
        return Err(OidcError::UnsupportedKeyType(jwk.kty.clone()));
    }

    let modulus = decode_component(jwk.n.as_deref(), "n")?;
    let exponent = decode_component(jwk.e.as_deref(), "e")?;

    let rsa_public_key = DerNode::sequence([
        DerNode::unsigned_integer(&modulus).encode(),
        DerNode::unsigned_integer(&exponent).encode(),
    ])
    .encode();

    let spki = DerNode::sequence([
        RSA_ALGORITHM_IDENTIFIER.to_vec(),
        DerNode::bit_string(&rsa_public_key).encode(),
    ])
    .encode();

    Ok(PublicKey { der: spki })
}

fn decode_component(value: Option<&str>, name: &str) -> Result<Vec<u8>> {
    let encoded = value
        .ok_or_else(|| OidcError::InvalidKeyFormat(format!("RSA key missing '{name}' component")))?;
    let bytes = base64url::decode(encoded)
        .map_err(|e| OidcError::InvalidKeyFormat(format!("'{name}' is not base64url: {e}")))?;
    if bytes.is_empty() {
        return Err(OidcError::InvalidKeyFormat(format!("'{name}' is empty")));
    }
    Ok(bytes)
}
