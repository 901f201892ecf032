// src/validator/jwt.rs

use crate::base64url;
use crate::error::{OidcError, Result};
use serde_json::{Map, Value};

/// A compact JWT split into its parts, not yet verified.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactJwt {
    pub header: Map<String, Value>,
    pub payload: Map<String, Value>,
    /// Third segment, still base64url. Decoded only when verifying.
    pub signature: String,
    /// `header.payload` exactly as received. Signatures are checked against
    /// these bytes, never against re-serialized JSON.
    pub signed_data: String,
}

impl CompactJwt {
    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }
}

/// Splits a compact JWT and decodes its header and payload.
///
/// # Errors
///
/// `MalformedToken` unless the token has exactly three dot-separated
/// segments whose first two are base64url JSON objects.
pub fn decode(token: &str) -> Result<CompactJwt> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(OidcError::MalformedToken(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }

    let header = decode_segment(parts[0], "header")?;
    let payload = decode_segment(parts[1], "payload")?;

    Ok(CompactJwt {
        header,
        payload,
        signature: parts[2].to_string(),
        signed_data: format!("{}.{}", parts[0], parts[1]),
    })
}

fn decode_segment(segment: &str, name: &str) -> Result<Map<String, Value>> {
    let bytes = base64url::decode(segment)
        .map_err(|e| OidcError::MalformedToken(format!("{name} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| OidcError::MalformedToken(format!("{name} is not a JSON object: {e}")))
}
