// Shared helpers for the integration tests.
#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use plain_oidc::config::{Config, ConfigBuilder};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CLIENT_ID: &str = "abc123";
pub const CLIENT_SECRET: &str = "test-secret";
pub const APP_BASE_URL: &str = "http://localhost:8080";

/// A 2048-bit PKCS#8 RSA key the test provider signs ID tokens with.
pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing_key.pem");
/// An unrelated key, for "wrong key" cases.
pub const OTHER_KEY_PEM: &str = include_str!("../fixtures/other_key.pem");

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

pub fn private_key(pem: &str) -> RsaPrivateKey {
    RsaPrivateKey::from_pkcs8_pem(pem).expect("test key should parse")
}

/// The unpadded big-endian modulus and exponent of a PEM key.
pub fn modulus_and_exponent(pem: &str) -> (Vec<u8>, Vec<u8>) {
    let public_key = private_key(pem).to_public_key();
    (public_key.n().to_bytes_be(), public_key.e().to_bytes_be())
}

/// The public half of `pem` as an RSA JWK.
pub fn rsa_jwk(pem: &str, kid: Option<&str>) -> Value {
    let (n, e) = modulus_and_exponent(pem);
    let mut jwk = json!({
        "kty": "RSA",
        "use": "sig",
        "alg": "RS256",
        "n": URL_SAFE_NO_PAD.encode(n),
        "e": URL_SAFE_NO_PAD.encode(e),
    });
    if let Some(kid) = kid {
        jwk["kid"] = json!(kid);
    }
    jwk
}

/// Signs `claims` as a compact JWT.
pub fn sign(pem: &str, alg: Algorithm, kid: Option<&str>, claims: &Value) -> String {
    // ring wants PKCS#1 DER, so go through the rsa crate first.
    let pkcs1_der = private_key(pem).to_pkcs1_der().unwrap();
    let encoding_key = EncodingKey::from_rsa_der(pkcs1_der.as_bytes());

    let mut header = Header::new(alg);
    header.kid = kid.map(String::from);
    encode(&header, claims, &encoding_key).unwrap()
}

/// Claims an ID token for `issuer` and `nonce` would carry on a good day.
pub fn id_token_claims(issuer: &str, nonce: &str) -> Value {
    let now = now();
    json!({
        "iss": issuer,
        "aud": CLIENT_ID,
        "sub": "00u1abcd",
        "email": "user@example.com",
        "name": "Test User",
        "iat": now,
        "exp": now + 3600,
        "nonce": nonce,
    })
}

/// Flips one bit in the signature segment of a compact JWT.
pub fn corrupt_signature(token: &str, bit: usize) -> String {
    let (signed_data, signature) = token.rsplit_once('.').unwrap();
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
    bytes[bit / 8] ^= 1 << (bit % 8);
    format!("{signed_data}.{}", URL_SAFE_NO_PAD.encode(bytes))
}

pub fn config(issuer: &str) -> Config {
    ConfigBuilder::new()
        .issuer(issuer)
        .unwrap()
        .client_id(CLIENT_ID)
        .client_secret(CLIENT_SECRET)
        .app_base_url(APP_BASE_URL)
        .unwrap()
        .build()
        .unwrap()
}
