//! Google ID token verification with JWKS caching

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::GOOGLE_ISSUERS;
use crate::crypto::constant_time_eq;
use crate::{AuthConfig, AuthError};

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JWK (JSON Web Key)
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    pub alg: Option<String>,
    pub n: String,
    pub e: String,
}

/// Claims extracted from a Google ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleClaims {
    /// Google's stable subject identifier for the account
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    /// Full display name
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Profile picture URL
    pub picture: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    /// OAuth client ID the token was issued for
    pub aud: String,
}

impl GoogleClaims {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Google ID token verifier with JWKS caching
///
/// Security features:
/// - Caches full JWKS to prevent fetch flooding attacks
/// - Rejects unknown key IDs without triggering refetch
/// - Uses constant-time comparison for audience validation
#[derive(Clone)]
pub struct GoogleVerifier {
    config: AuthConfig,
    http_client: reqwest::Client,
    /// Cache of kid -> DecodingKey
    key_cache: Cache<String, Arc<DecodingKey>>,
    /// Cache of known valid key IDs (prevents fetch flooding)
    /// Maps "jwks" -> list of known kids
    jwks_kids_cache: Cache<String, Arc<Vec<String>>>,
}

impl GoogleVerifier {
    /// Create a new verifier with an HTTP client tuned for JWKS fetching.
    ///
    /// Security: JWKS fetching is protected against flooding attacks by
    /// caching known key IDs and rejecting unknown IDs without refetching.
    pub fn new(config: AuthConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2) // JWKS is a single host
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(config, http_client)
    }

    /// Create a verifier with a custom HTTP client.
    ///
    /// Use this when you need custom proxy settings, TLS config, or
    /// want to share an HTTP client across services.
    pub fn with_client(config: AuthConfig, http_client: reqwest::Client) -> Self {
        let cache_duration = config.jwks_cache_duration;
        Self {
            config,
            http_client,
            key_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(100)
                .build(),
            jwks_kids_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(1) // Only one entry: "jwks" -> kids list
                .build(),
        }
    }

    /// Verify a Google ID token and return its claims.
    ///
    /// Checks signature against Google's published keys, issuer, audience
    /// (against the configured OAuth client ID, in constant time), and
    /// time bounds with the configured clock skew. Every verification
    /// failure surfaces as the same credential error.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleClaims, AuthError> {
        let header = decode_header(id_token).map_err(|e| {
            tracing::debug!("failed to decode Google token header: {}", e);
            AuthError::InvalidCredentials
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("Google token missing kid");
            AuthError::InvalidCredentials
        })?;

        let decoding_key = self.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.leeway = self.config.clock_skew.as_secs();
        // Audience is checked manually below in constant time
        validation.validate_aud = false;

        let token_data =
            decode::<GoogleClaims>(id_token, &decoding_key, &validation).map_err(|e| {
                tracing::debug!("Google token validation failed: {}", e);
                AuthError::InvalidCredentials
            })?;

        let claims = token_data.claims;

        if !constant_time_eq(
            claims.aud.as_bytes(),
            self.config.google_client_id.as_bytes(),
        ) {
            tracing::debug!("Google token audience mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(claims)
    }

    /// Get a decoding key for the given kid
    ///
    /// Security: This method is protected against JWKS fetch flooding attacks.
    /// If we have a cached list of known key IDs, we reject unknown IDs
    /// immediately without triggering a refetch.
    async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        // Check key cache first (fast path)
        if let Some(key) = self.key_cache.get(kid).await {
            return Ok(key);
        }

        // Check if we have a cached list of known kids
        // If yes and kid isn't in it, reject immediately (no refetch)
        if let Some(known_kids) = self.jwks_kids_cache.get("jwks").await {
            if !known_kids.contains(&kid.to_string()) {
                tracing::debug!(
                    "unknown key ID '{}' not in cached JWKS (known: {:?})",
                    kid,
                    known_kids.as_ref()
                );
                return Err(AuthError::InvalidCredentials);
            }
        }

        // Fetch JWKS (either no cache or kid might be in known list)
        let jwks = self.fetch_jwks().await?;

        // Cache the list of known kids to prevent future flooding
        let kids: Vec<String> = jwks.keys.iter().map(|k| k.kid.clone()).collect();
        self.jwks_kids_cache
            .insert("jwks".to_string(), Arc::new(kids))
            .await;

        // Find the key with matching kid
        let jwk = jwks.keys.iter().find(|k| k.kid == kid).ok_or_else(|| {
            tracing::debug!("key not found in JWKS: {}", kid);
            AuthError::InvalidCredentials
        })?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            tracing::error!("failed to create decoding key: {}", e);
            AuthError::Internal("failed to create decoding key".to_string())
        })?;

        let key = Arc::new(decoding_key);

        // Cache all keys from the JWKS
        for k in &jwks.keys {
            if let Ok(dk) = DecodingKey::from_rsa_components(&k.n, &k.e) {
                self.key_cache.insert(k.kid.clone(), Arc::new(dk)).await;
            }
        }

        Ok(key)
    }

    /// Fetch the key set from Google's JWKS endpoint
    async fn fetch_jwks(&self) -> Result<Jwks, AuthError> {
        let url = &self.config.google_jwks_url;
        tracing::debug!("fetching JWKS from {}", url);

        let response = self
            .http_client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("failed to fetch JWKS: {}", e);
                AuthError::Internal("failed to fetch JWKS".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!("JWKS fetch returned status: {}", response.status());
            return Err(AuthError::Internal("failed to fetch JWKS".to_string()));
        }

        response.json::<Jwks>().await.map_err(|e| {
            tracing::error!("failed to parse JWKS: {}", e);
            AuthError::Internal("failed to parse JWKS".to_string())
        })
    }

    /// Invalidate all caches (useful when Google rotates keys)
    pub async fn invalidate_cache(&self) {
        self.key_cache.invalidate_all();
        self.jwks_kids_cache.invalidate_all();
    }
}

impl std::fmt::Debug for GoogleVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleVerifier")
            .field("jwks_url", &self.config.google_jwks_url)
            .finish_non_exhaustive()
    }
}
