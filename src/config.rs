// src/config.rs

use crate::error::{OidcError, Result};
use std::time::Duration;
use url::Url;

const DEFAULT_SCOPES: [&str; 3] = ["openid", "profile", "email"];
const CALLBACK_PATH: &str = "/authorization-code/callback";

/// The relying-party configuration for one OIDC client registration.
///
/// Values are treated as opaque strings once built. It should be constructed
/// using the `ConfigBuilder`.
#[derive(Clone, Debug)]
pub struct Config {
    /// The issuer of the OIDC provider, without a trailing slash.
    /// Discovery is rooted here and the `iss` claim must equal it exactly.
    pub issuer: String,
    /// The client ID, as registered with the provider. Expected in `aud`.
    pub client_id: String,
    /// The client secret sent to the token endpoint.
    pub client_secret: String,
    /// Public base URL of this application, without a trailing slash.
    pub app_base_url: String,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
    /// Timeout applied to every request made to the provider.
    pub http_timeout: Duration,
    /// How far in the future an `iat` claim may lie. Defaults to 5 minutes.
    pub clock_skew: Duration,
    /// When set, discovery documents and key sets are cached for this long.
    pub metadata_cache_ttl: Option<Duration>,
}

impl Config {
    /// Where the provider sends the browser back after login.
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.app_base_url, CALLBACK_PATH)
    }

    /// Where the provider sends the browser after RP-initiated logout.
    pub fn post_logout_redirect_uri(&self) -> String {
        format!("{}/", self.app_base_url)
    }

    pub fn discovery_url(&self) -> Result<Url> {
        discovery_url(&self.issuer)
    }

    /// The logout endpoint used when discovery does not advertise one.
    pub fn fallback_logout_url(&self) -> Result<Url> {
        parse_url(&format!("{}/v1/logout", self.issuer))
    }

    /// The space-separated `scope` parameter.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Builds `{issuer}/.well-known/openid-configuration`.
pub(crate) fn discovery_url(issuer: &str) -> Result<Url> {
    parse_url(&format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    ))
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| OidcError::InvalidUrl(format!("{raw}: {e}")))
}

/// A builder for creating a `Config` instance.
///
/// ```
/// use plain_oidc::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .issuer("https://example.okta.com/oauth2/default/").unwrap()
///     .client_id("abc123")
///     .client_secret("s3cret")
///     .app_base_url("http://localhost:8080").unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.issuer, "https://example.okta.com/oauth2/default");
/// assert_eq!(config.redirect_uri(), "http://localhost:8080/authorization-code/callback");
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    issuer: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    app_base_url: Option<String>,
    scopes: Option<Vec<String>>,
    http_timeout: Option<Duration>,
    clock_skew: Option<Duration>,
    metadata_cache_ttl: Option<Duration>,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the issuer URL of the OIDC provider. This is a required field.
    ///
    /// # Arguments
    ///
    /// * `url` - The issuer URL, e.g., "https://example.okta.com/oauth2/default".
    pub fn issuer(mut self, url: &str) -> Result<Self> {
        let trimmed = url.trim_end_matches('/');
        parse_url(trimmed)?;
        self.issuer = Some(trimmed.to_string());
        Ok(self)
    }

    /// Sets the client ID of the application. This is a required field.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the client secret. This is a required field.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Sets the public base URL of the application. This is a required field.
    pub fn app_base_url(mut self, url: &str) -> Result<Self> {
        let trimmed = url.trim_end_matches('/');
        parse_url(trimmed)?;
        self.app_base_url = Some(trimmed.to_string());
        Ok(self)
    }

    /// Overrides the requested scopes. Defaults to `openid profile email`.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the per-request timeout. Defaults to 10 seconds.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets the `iat` clock skew tolerance. Defaults to 300 seconds.
    pub fn clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = Some(skew);
        self
    }

    /// Enables caching of discovery documents and key sets. Off by default,
    /// so every login fetches both documents again.
    pub fn metadata_cache_ttl(mut self, ttl: Duration) -> Self {
        self.metadata_cache_ttl = Some(ttl);
        self
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns `OidcError::Configuration` if a required field is missing or empty.
    pub fn build(self) -> Result<Config> {
        let issuer = required(self.issuer, "issuer")?;
        let client_id = required(self.client_id, "client_id")?;
        let client_secret = required(self.client_secret, "client_secret")?;
        let app_base_url = required(self.app_base_url, "app_base_url")?;

        let scopes = self
            .scopes
            .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect());
        if scopes.is_empty() {
            return Err(OidcError::Configuration("scopes must not be empty".to_string()));
        }

        Ok(Config {
            issuer,
            client_id,
            client_secret,
            app_base_url,
            scopes,
            http_timeout: self.http_timeout.unwrap_or(Duration::from_secs(10)),
            clock_skew: self.clock_skew.unwrap_or(Duration::from_secs(300)),
            metadata_cache_ttl: self.metadata_cache_ttl,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(OidcError::Configuration(format!(
            "missing required configuration: {name}"
        ))),
    }
}
