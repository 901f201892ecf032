// src/validator/claims.rs

use crate::error::{OidcError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// The `aud` claim, which providers send either as one string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Self::Single(aud) => aud == client_id,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }
}

/// The claims decoded from an ID Token.
///
/// Everything is optional at the type level so that a payload missing `iss`,
/// `aud` or `exp` surfaces as the matching validation error rather than a
/// parse failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Claims {
    pub iss: Option<String>,
    pub aud: Option<Audience>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub nonce: Option<String>,
    pub sub: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Any other claims the provider included.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The expectations an ID Token's claims are checked against.
#[derive(Debug, Clone)]
pub struct ClaimsExpectations<'a> {
    pub issuer: &'a str,
    pub client_id: &'a str,
    pub nonce: &'a str,
    /// Unix seconds.
    pub now: i64,
    /// Tolerance for `iat` lying in the future.
    pub clock_skew: Duration,
}

/// Checks issuer, audience, expiry, issued-at and nonce, in that order,
/// stopping at the first failure.
pub fn validate(claims: &Claims, expected: &ClaimsExpectations<'_>) -> Result<()> {
    let iss = claims.iss.as_deref().unwrap_or_default();
    if iss != expected.issuer {
        return Err(OidcError::InvalidIssuer {
            expected: expected.issuer.to_string(),
            actual: iss.to_string(),
        });
    }

    if !claims
        .aud
        .as_ref()
        .is_some_and(|aud| aud.contains(expected.client_id))
    {
        return Err(OidcError::InvalidAudience(expected.client_id.to_string()));
    }

    let exp = claims.exp.unwrap_or(0);
    if exp < expected.now {
        return Err(OidcError::TokenExpired { exp, now: expected.now });
    }

    if let Some(iat) = claims.iat {
        let skew = i64::try_from(expected.clock_skew.as_secs()).unwrap_or(i64::MAX);
        if iat > expected.now.saturating_add(skew) {
            return Err(OidcError::TokenIssuedInFuture { iat, now: expected.now });
        }
    }

    if claims.nonce.as_deref() != Some(expected.nonce) {
        return Err(OidcError::InvalidNonce);
    }

    Ok(())
}
