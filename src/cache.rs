// src/cache.rs

use crate::client::ProviderSource;
use crate::error::Result;
use crate::model::{JwkSet, OidcConfiguration, TokenRequest, TokenResponse};
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Max distinct issuers / key set URIs kept. One relying party normally
/// talks to a single provider.
const MAX_ENTRIES: u64 = 16;

/// A time-to-live cache in front of another [`ProviderSource`].
///
/// Discovery documents are keyed by issuer and key sets by `jwks_uri`. Only
/// successful fetches are stored. Code exchange always goes to the inner
/// source.
pub struct CachedProvider<P> {
    inner: P,
    discovery: Cache<String, OidcConfiguration>,
    keys: Cache<String, JwkSet>,
}

impl<P: ProviderSource> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            discovery: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            keys: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Drops every cached document, e.g. after the provider rotated keys.
    pub fn invalidate_all(&self) {
        self.discovery.invalidate_all();
        self.keys.invalidate_all();
    }
}

#[async_trait]
impl<P: ProviderSource> ProviderSource for CachedProvider<P> {
    #[instrument(skip(self), err)]
    async fn discover(&self, issuer: &str) -> Result<OidcConfiguration> {
        if let Some(document) = self.discovery.get(issuer).await {
            debug!("Discovery cache hit for issuer: {}", issuer);
            return Ok(document);
        }

        debug!("Discovery cache miss for issuer: {}. Fetching from provider.", issuer);
        let document = self.inner.discover(issuer).await?;
        self.discovery
            .insert(issuer.to_string(), document.clone())
            .await;
        Ok(document)
    }

    #[instrument(skip(self), err)]
    async fn fetch_keys(&self, jwks_uri: &Url) -> Result<JwkSet> {
        if let Some(keys) = self.keys.get(jwks_uri.as_str()).await {
            debug!("JWKS cache hit for: {}", jwks_uri);
            return Ok(keys);
        }

        debug!("JWKS cache miss for: {}. Fetching from provider.", jwks_uri);
        let keys = self.inner.fetch_keys(jwks_uri).await?;
        self.keys.insert(jwks_uri.to_string(), keys.clone()).await;
        Ok(keys)
    }

    async fn exchange_code(
        &self,
        token_endpoint: &Url,
        request: &TokenRequest<'_>,
    ) -> Result<TokenResponse> {
        self.inner.exchange_code(token_endpoint, request).await
    }
}
