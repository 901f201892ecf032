// src/flow.rs

use crate::cache::CachedProvider;
use crate::client::{ProviderClient, ProviderSource};
use crate::config::Config;
use crate::error::{OidcError, Result};
use crate::model::TokenRequest;
use crate::session::{SessionStore, UserIdentity, ID_TOKEN, OIDC_NONCE, OIDC_STATE, USER};
use crate::validator::IdTokenValidator;
use rand::RngCore;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};
use url::Url;

/// Bytes of randomness behind each `state` and `nonce` (hex-encoded to 32 chars).
const RANDOM_TOKEN_BYTES: usize = 16;

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parses a raw query string (without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        params
    }
}

/// What the protected page should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(UserIdentity),
    /// Send the browser to the provider's authorization endpoint.
    Redirect(Url),
}

/// Drives the Authorization Code flow for one client registration.
///
/// Session state moves through
/// `Unauthenticated -> AuthorizationInitiated (state/nonce stored) -> Authenticated`,
/// and logout returns it to `Unauthenticated`. Nothing is written to the
/// session unless every step of a transition succeeded.
#[derive(Clone)]
pub struct AuthorizationFlow {
    config: Config,
    provider: Arc<dyn ProviderSource>,
    validator: IdTokenValidator,
}

impl AuthorizationFlow {
    /// Creates a flow talking to the provider over HTTP, with the metadata
    /// cache in front when `metadata_cache_ttl` is configured.
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(config.http_timeout)?;
        let provider: Arc<dyn ProviderSource> = match config.metadata_cache_ttl {
            Some(ttl) => Arc::new(CachedProvider::new(client, ttl)),
            None => Arc::new(client),
        };
        Ok(Self::with_provider(config, provider))
    }

    pub fn with_provider(config: Config, provider: Arc<dyn ProviderSource>) -> Self {
        let validator = IdTokenValidator::from_config(&config);
        Self {
            config,
            provider,
            validator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The signed-in user, if any.
    pub fn current_user<S: SessionStore + ?Sized>(session: &S) -> Option<UserIdentity> {
        session.get(USER).and_then(UserIdentity::from_value)
    }

    /// Gate for protected pages: returns the stored user, or starts a new
    /// authorization when there is none.
    pub async fn authenticate<S: SessionStore + ?Sized>(&self, session: &mut S) -> Result<LoginOutcome> {
        if let Some(user) = Self::current_user(session) {
            return Ok(LoginOutcome::Authenticated(user));
        }
        self.start_authorization(session)
            .await
            .map(LoginOutcome::Redirect)
    }

    /// Generates a fresh `state` and `nonce`, stores both in the session and
    /// returns the provider's authorization URL.
    #[instrument(skip_all, err)]
    pub async fn start_authorization<S: SessionStore + ?Sized>(&self, session: &mut S) -> Result<Url> {
        let discovery = self.provider.discover(&self.config.issuer).await?;

        let state = random_token();
        let nonce = random_token();

        let mut url = discovery.authorization_endpoint;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri())
            .append_pair("scope", &self.config.scope())
            .append_pair("state", &state)
            .append_pair("nonce", &nonce);

        session.set(OIDC_STATE, Value::String(state));
        session.set(OIDC_NONCE, Value::String(nonce));
        Ok(url)
    }

    /// Completes a login from the provider's redirect back to the callback URL.
    ///
    /// The `state` check happens before any network call. The ID token is
    /// decoded, verified and validated against the nonce from the session
    /// before the session is touched; on success the pending `state`/`nonce`
    /// are removed and the ID token and user stored.
    #[instrument(skip_all, err)]
    pub async fn handle_callback<S: SessionStore + ?Sized>(
        &self,
        params: &CallbackParams,
        session: &mut S,
    ) -> Result<UserIdentity> {
        if let Some(error) = &params.error {
            warn!(%error, "Provider returned an authorization error");
            return Err(OidcError::ProviderAuthorization {
                error: error.clone(),
                description: params.error_description.clone().unwrap_or_default(),
            });
        }

        let expected_state = session.get_str(OIDC_STATE).unwrap_or_default();
        let state = params.state.as_deref().unwrap_or_default();
        if !states_match(state, &expected_state) {
            warn!("Callback state does not match the session");
            return Err(OidcError::CsrfStateMismatch);
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(OidcError::MissingAuthorizationCode)?;

        let discovery = self.provider.discover(&self.config.issuer).await?;

        let redirect_uri = self.config.redirect_uri();
        let tokens = self
            .provider
            .exchange_code(
                &discovery.token_endpoint,
                &TokenRequest {
                    grant_type: "authorization_code",
                    code,
                    redirect_uri: &redirect_uri,
                    client_id: &self.config.client_id,
                    client_secret: &self.config.client_secret,
                },
            )
            .await?;
        let id_token = tokens
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or(OidcError::MissingIdToken)?;

        let keys = self.provider.fetch_keys(&discovery.jwks_uri).await?;
        let expected_nonce = session.get_str(OIDC_NONCE).ok_or(OidcError::InvalidNonce)?;
        let claims = self
            .validator
            .validate(&id_token, &keys, &expected_nonce, unix_now())?;

        let user = UserIdentity::from_claims(&claims);
        session.delete(OIDC_STATE);
        session.delete(OIDC_NONCE);
        session.set(ID_TOKEN, Value::String(id_token));
        session.set(USER, user.to_value());

        info!(sub = ?user.sub, "User authenticated");
        Ok(user)
    }

    /// Ends the local session and returns the provider's end-session URL
    /// (RP-initiated logout).
    ///
    /// The session is cleared before the provider is contacted, so the user
    /// is logged out locally even when discovery fails.
    #[instrument(skip_all, err)]
    pub async fn build_logout_redirect<S: SessionStore + ?Sized>(&self, session: &mut S) -> Result<Url> {
        let id_token = session.get_str(ID_TOKEN);
        session.clear();

        let discovery = self.provider.discover(&self.config.issuer).await?;
        let mut url = match discovery.end_session_endpoint {
            Some(endpoint) => endpoint,
            None => self.config.fallback_logout_url()?,
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("post_logout_redirect_uri", &self.config.post_logout_redirect_uri());
            if let Some(id_token) = id_token.as_deref().filter(|t| !t.is_empty()) {
                query.append_pair("id_token_hint", id_token);
            }
        }

        info!("Session cleared, redirecting to provider logout");
        Ok(url)
    }
}

/// An empty `state` never matches, even against an empty session.
fn states_match(received: &str, expected: &str) -> bool {
    !received.is_empty() && bool::from(received.as_bytes().ct_eq(expected.as_bytes()))
}

fn random_token() -> String {
    let mut bytes = [0u8; RANDOM_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
