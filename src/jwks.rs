// ABOUTME: Verification-key material fetching and caching for external token validation
// ABOUTME: Caches the provider's key set on a TTL and force-refreshes on unknown key ids
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! JWKS (JSON Web Key Set) retrieval and caching
//!
//! The external identity provider publishes its public verification keys at
//! `{issuer}/protocol/openid-connect/certs` and rotates them periodically.
//! [`JwksProvider`] keeps a process-local cache of that document:
//!
//! - an unexpired cache serves lookups without network access
//! - an expired cache is refreshed and replaced wholesale, so readers see
//!   either the fully-old or fully-new key set
//! - a fetch failure degrades to the previous cached set (or an empty set),
//!   never an error; the token codec treats "no keys" as a validation failure
//! - a lookup miss for a specific key id forces exactly one refresh before
//!   giving up, which tolerates key rotation between cache expiries
//!
//! The fetcher is a trait so tests can drive the cache with fake key sets
//! and short TTLs instead of a live provider.

use crate::config::environment::KeycloakConfig;
use crate::constants::limits;
use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// JWK (JSON Web Key) representation, the shape served by the certs endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key ID for rotation tracking
    pub kid: String,
    /// Key type ("RSA" for RS256)
    pub kty: String,
    /// Public key use ("sig" for signature keys)
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Algorithm hint (RS256)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus (base64url encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA exponent (base64url encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

/// JWKS container as served by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkSet {
    /// Array of public keys
    pub keys: Vec<Jwk>,
}

/// Errors turning a JWK into a verification key
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
    #[error("key {kid} missing RSA component {component}")]
    MissingComponent { kid: String, component: &'static str },
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

impl Jwk {
    /// Build a `DecodingKey` from this JWK's public material
    ///
    /// # Errors
    ///
    /// Returns an error for non-RSA key types or missing/invalid `n`/`e`
    /// components.
    pub fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
        if self.kty != "RSA" {
            return Err(KeyError::UnsupportedKeyType(self.kty.clone()));
        }
        let n = self.n.as_ref().ok_or(KeyError::MissingComponent {
            kid: self.kid.clone(),
            component: "n",
        })?;
        let e = self.e.as_ref().ok_or(KeyError::MissingComponent {
            kid: self.kid.clone(),
            component: "e",
        })?;

        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| KeyError::InvalidKeyMaterial(e.to_string()))
    }
}

/// Errors fetching the key document from the provider
#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("key endpoint request failed: {0}")]
    Request(String),
    #[error("key endpoint returned status {0}")]
    Status(u16),
    #[error("key document malformed: {0}")]
    Malformed(String),
}

/// Source of key material. Production uses [`HttpKeyFetcher`]; tests inject
/// fakes with controlled key sets and failure modes.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    /// Fetch the current key set from the source
    async fn fetch_keys(&self) -> Result<Vec<Jwk>, KeyFetchError>;
}

/// HTTP fetcher for the provider's certs endpoint
pub struct HttpKeyFetcher {
    certs_url: String,
    http_client: reqwest::Client,
}

impl HttpKeyFetcher {
    /// Create a fetcher for the given certs URL with a bounded timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(certs_url: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(limits::UPSTREAM_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            certs_url: certs_url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch_keys(&self) -> Result<Vec<Jwk>, KeyFetchError> {
        let response = self
            .http_client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyFetchError::Status(status.as_u16()));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeyFetchError::Malformed(e.to_string()))?;

        Ok(jwks.keys)
    }
}

/// Cached key set with an absolute expiry; replaced wholesale on refresh
#[derive(Default)]
struct KeyCache {
    keys: Vec<Jwk>,
    /// None until the first successful fetch
    expires_at: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Instant::now() < expires_at)
    }
}

/// Cached provider of external verification keys
pub struct JwksProvider {
    fetcher: Arc<dyn KeyFetcher>,
    cache_ttl: Duration,
    cache: RwLock<KeyCache>,
}

impl JwksProvider {
    /// Create a provider over an arbitrary fetcher
    #[must_use]
    pub fn new(fetcher: Arc<dyn KeyFetcher>, cache_ttl: Duration) -> Self {
        Self {
            fetcher,
            cache_ttl,
            cache: RwLock::new(KeyCache::default()),
        }
    }

    /// Create a provider fetching from the configured identity provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP fetcher cannot be constructed.
    pub fn from_config(config: &KeycloakConfig) -> anyhow::Result<Self> {
        let fetcher = HttpKeyFetcher::new(config.certs_url())?;
        Ok(Self::new(
            Arc::new(fetcher),
            Duration::from_secs(config.jwks_cache_ttl_seconds),
        ))
    }

    /// Get the current key set.
    ///
    /// Serves from cache while unexpired; otherwise fetches, replaces the
    /// cache, and returns the fresh set. On fetch failure the previous
    /// cached set (possibly empty) is returned — key unavailability
    /// surfaces as a token-validation failure downstream, not an error here.
    pub async fn get_keys(&self) -> Vec<Jwk> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh() {
                return cache.keys.clone();
            }
        }

        self.refresh().await
    }

    /// Look up a key by id, forcing a single refresh on a miss.
    ///
    /// A miss against a fresh cache usually means the provider rotated its
    /// keys since the last fetch; one forced refresh picks up the rotation
    /// before the lookup is declared failed.
    pub async fn find_key(&self, kid: &str) -> Option<Jwk> {
        let keys = self.get_keys().await;
        if let Some(key) = keys.iter().find(|key| key.kid == kid) {
            return Some(key.clone());
        }

        debug!("key id {kid} not in cached set, forcing refresh");
        let keys = self.refresh().await;
        keys.into_iter().find(|key| key.kid == kid)
    }

    /// Fetch the key set and swap it into the cache.
    ///
    /// The expiry is only advanced on success, so a failed refresh leaves
    /// the next caller free to retry immediately. Concurrent refreshes are
    /// last-writer-wins; the document is idempotent to re-fetch.
    async fn refresh(&self) -> Vec<Jwk> {
        match self.fetcher.fetch_keys().await {
            Ok(keys) => {
                let mut cache = self.cache.write().await;
                cache.keys.clone_from(&keys);
                cache.expires_at = Some(Instant::now() + self.cache_ttl);
                debug!("refreshed verification key set: {} keys", keys.len());
                keys
            }
            Err(e) => {
                warn!("failed to fetch verification keys, serving stale set: {e}");
                self.cache.read().await.keys.clone()
            }
        }
    }
}
