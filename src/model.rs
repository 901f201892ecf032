// src/model.rs

use serde::{Deserialize, Serialize};
use url::Url;

/// Represents the data structure of an OIDC provider's discovery document.
/// Found at the `.well-known/openid-configuration` endpoint.
///
/// Only the fields this crate uses are modelled. A document lacking one of the
/// required endpoints fails to deserialize.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OidcConfiguration {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    pub jwks_uri: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<Url>,
}

/// Represents a single JSON Web Key (JWK) as defined in RFC 7517.
///
/// `n` and `e` are optional here so that key sets mixing in EC or symmetric
/// keys still parse; the converter rejects anything that is not RSA.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Base64url big-endian modulus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// Base64url big-endian public exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    pub fn is_rsa(&self) -> bool {
        self.kty == "RSA"
    }

    /// A key is usable for signatures when `use` is absent or `sig`.
    pub fn is_signing_key(&self) -> bool {
        matches!(self.use_purpose.as_deref(), None | Some("sig"))
    }
}

/// Represents a JSON Web Key Set (JWKS), which is a collection of JWKs.
/// Order is preserved; it decides which key wins when the token has no `kid`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Finds the key with the given `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// The first RSA key usable for signatures.
    pub fn first_rsa_signing_key(&self) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.is_rsa() && k.is_signing_key())
    }
}

/// The form fields sent to the token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'a str,
    pub code: &'a str,
    pub redirect_uri: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// The token endpoint's answer. Only `id_token` is consumed by the flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
