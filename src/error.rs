// src/error.rs

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = OidcError> = std::result::Result<T, E>;

/// The primary error type for the `plain-oidc` library.
///
/// Every step of the authorization flow reports failures through one of these
/// variants. The `Display` text is the human-readable detail that a rendering
/// layer may show to the user.
#[derive(Debug, Error)]
pub enum OidcError {
    /// A required configuration value is missing or empty.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (connect failure, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered, but not with the document we asked for.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The JWK is not an RSA key.
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// An RSA JWK is missing `n`/`e`, or they do not decode to usable integers.
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// The token is not a three-part compact JWT with JSON header and payload.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// No JWK in the key set can be used for this token.
    #[error("No matching key found in JWKS: {0}")]
    KeyNotFound(String),

    /// The `alg` header names something other than RS256/RS384/RS512.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("JWT signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("Invalid issuer: expected '{expected}', got '{actual}'")]
    InvalidIssuer { expected: String, actual: String },

    #[error("Invalid audience: '{0}' is not an accepted audience")]
    InvalidAudience(String),

    #[error("Token has expired (exp {exp}, now {now})")]
    TokenExpired { exp: i64, now: i64 },

    #[error("Token issued in the future (iat {iat}, now {now})")]
    TokenIssuedInFuture { iat: i64, now: i64 },

    /// The nonce in the token does not match the one bound to the session.
    #[error("Invalid nonce: the nonce in the token does not match the expected nonce")]
    InvalidNonce,

    /// The callback `state` does not match the value stored in the session.
    #[error("Invalid state parameter")]
    CsrfStateMismatch,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    /// The token endpoint refused the code exchange.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("No ID token in token response")]
    MissingIdToken,

    /// The provider redirected back with an `error` parameter.
    #[error("Authorization error: {error} - {description}")]
    ProviderAuthorization { error: String, description: String },
}
