// src/lib.rs

//! OpenID Connect Authorization Code flow for relying parties.
//!
//! Discovery, JWKS retrieval, JWK to SubjectPublicKeyInfo conversion, JWT
//! decoding, signature verification and claims validation are implemented
//! in this crate; the `rsa` crate only supplies the PKCS#1 v1.5 arithmetic.

mod base64url;

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod key;
pub mod model;
pub mod session;
pub mod validator;

/// The public prelude for the `plain-oidc` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::cache::CachedProvider;
    pub use crate::client::{HttpFetcher, ProviderClient, ProviderSource};
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::error::{OidcError, Result};
    pub use crate::flow::{AuthorizationFlow, CallbackParams, LoginOutcome};
    pub use crate::key::{to_public_key, PublicKey};
    pub use crate::model::{Jwk, JwkSet, OidcConfiguration, TokenRequest, TokenResponse};
    pub use crate::session::{MemorySession, SessionStore, UserIdentity};
    pub use crate::validator::claims::{Audience, Claims};
    pub use crate::validator::jwt::CompactJwt;
    pub use crate::validator::signature::SigningAlgorithm;
    pub use crate::validator::IdTokenValidator;
}
