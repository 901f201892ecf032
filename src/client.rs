// src/client.rs

use crate::config;
use crate::error::{OidcError, Result};
use crate::model::{JwkSet, OidcConfiguration, TokenRequest, TokenResponse};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Everything the authorization flow needs from the identity provider.
///
/// `ProviderClient` fetches on every call. A caching layer such as
/// [`crate::cache::CachedProvider`] can be put in front without the flow or
/// the validator noticing.
#[async_trait]
pub trait ProviderSource: Send + Sync {
    /// Fetches `{issuer}/.well-known/openid-configuration`.
    async fn discover(&self, issuer: &str) -> Result<OidcConfiguration>;

    /// Fetches the provider's signing keys.
    async fn fetch_keys(&self, jwks_uri: &Url) -> Result<JwkSet>;

    /// Redeems an authorization code at the token endpoint.
    async fn exchange_code(
        &self,
        token_endpoint: &Url,
        request: &TokenRequest<'_>,
    ) -> Result<TokenResponse>;
}

#[async_trait]
impl<T: ProviderSource + ?Sized> ProviderSource for Arc<T> {
    async fn discover(&self, issuer: &str) -> Result<OidcConfiguration> {
        (**self).discover(issuer).await
    }

    async fn fetch_keys(&self, jwks_uri: &Url) -> Result<JwkSet> {
        (**self).fetch_keys(jwks_uri).await
    }

    async fn exchange_code(
        &self,
        token_endpoint: &Url,
        request: &TokenRequest<'_>,
    ) -> Result<TokenResponse> {
        (**self).exchange_code(token_endpoint, request).await
    }
}

/// A thin JSON-over-HTTP client with a fixed per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    // reqwest::Client is internally ref-counted, cloning is cheap.
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// GETs `url` and deserializes the body.
    ///
    /// Transport failures are `Network`; a non-200 status or a body that is
    /// not the expected JSON is `MalformedResponse`.
    #[instrument(skip(self), err)]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(OidcError::MalformedResponse(format!(
                "GET {url} returned HTTP {}",
                status.as_u16()
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| OidcError::MalformedResponse(format!("GET {url}: {e}")))
    }

    /// POSTs `form` url-encoded and returns the raw status and body.
    #[instrument(skip(self, form), err)]
    pub async fn post_form<F>(&self, url: &Url, form: &F) -> Result<(StatusCode, String)>
    where
        F: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(url.clone())
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// The uncached provider: each call goes to the network.
#[derive(Clone, Debug)]
pub struct ProviderClient {
    http: HttpFetcher,
}

impl ProviderClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new(timeout)?))
    }

    pub fn with_fetcher(http: HttpFetcher) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderSource for ProviderClient {
    #[instrument(skip(self), err)]
    async fn discover(&self, issuer: &str) -> Result<OidcConfiguration> {
        let discovery_url = config::discovery_url(issuer)?;
        debug!("Performing OIDC discovery at: {}", discovery_url);

        let document: OidcConfiguration = self.http.get_json(&discovery_url).await?;
        if document.issuer.trim_end_matches('/') != issuer.trim_end_matches('/') {
            warn!(advertised = %document.issuer, "Discovery document advertises a different issuer");
        }
        Ok(document)
    }

    #[instrument(skip(self), err)]
    async fn fetch_keys(&self, jwks_uri: &Url) -> Result<JwkSet> {
        let jwks: JwkSet = self.http.get_json(jwks_uri).await?;
        debug!("Successfully fetched {} keys from {}", jwks.keys.len(), jwks_uri);
        Ok(jwks)
    }

    #[instrument(skip(self, request), err)]
    async fn exchange_code(
        &self,
        token_endpoint: &Url,
        request: &TokenRequest<'_>,
    ) -> Result<TokenResponse> {
        let (status, body) = self.http.post_form(token_endpoint, request).await?;
        if status != StatusCode::OK {
            return Err(OidcError::TokenExchange(format!(
                "HTTP {} - {}",
                status.as_u16(),
                body
            )));
        }

        let tokens: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            OidcError::MalformedResponse(format!("invalid JSON in token response: {e}"))
        })?;

        if let Some(error) = &tokens.error {
            return Err(OidcError::TokenExchange(format!(
                "{} - {}",
                error,
                tokens.error_description.as_deref().unwrap_or_default()
            )));
        }

        debug!(token_type = ?tokens.token_type, "Authorization code exchanged");
        Ok(tokens)
    }
}
