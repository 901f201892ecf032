// src/validator/mod.rs

pub mod claims;
pub mod jwt;
pub mod signature;

use crate::config::Config;
use crate::error::Result;
use crate::model::JwkSet;
use claims::{Claims, ClaimsExpectations};
use std::time::Duration;
use tracing::{debug, instrument};

/// The OIDC ID Token validator.
///
/// Runs decode, signature verification and claims validation in sequence
/// against a key set the caller has already fetched.
#[derive(Debug, Clone)]
pub struct IdTokenValidator {
    issuer: String,
    client_id: String,
    clock_skew: Duration,
}

impl IdTokenValidator {
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>, clock_skew: Duration) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            clock_skew,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.issuer, &config.client_id, config.clock_skew)
    }

    /// Validates an OIDC ID Token.
    ///
    /// This method performs a full validation of the token, including:
    /// 1. Splitting and decoding the compact JWT.
    /// 2. Signature verification against `keys`.
    /// 3. Validation of `iss`, `aud`, `exp`, `iat` and `nonce`.
    ///
    /// # Arguments
    ///
    /// * `token` - The raw ID Token string.
    /// * `keys` - The provider's current key set.
    /// * `expected_nonce` - The nonce bound to this login attempt.
    /// * `now` - The current time in unix seconds.
    #[instrument(skip(self, token, keys, expected_nonce), err)]
    pub fn validate(&self, token: &str, keys: &JwkSet, expected_nonce: &str, now: i64) -> Result<Claims> {
        let jwt = jwt::decode(token)?;
        let claims = signature::verify(&jwt, keys)?;

        claims::validate(
            &claims,
            &ClaimsExpectations {
                issuer: &self.issuer,
                client_id: &self.client_id,
                nonce: expected_nonce,
                now,
                clock_skew: self.clock_skew,
            },
        )?;

        debug!(sub = ?claims.sub, "ID token claims validated");
        Ok(claims)
    }
}
