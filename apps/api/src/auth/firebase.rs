//! Firebase ID token verification.
//!
//! Tokens are RS256 JWTs signed by Google. Public keys are published as a JWK
//! set and rotate regularly, so the set is kept for as long as the response's
//! `Cache-Control: max-age` allows and refetched when an unknown `kid` shows up.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::{header::CACHE_CONTROL, Client};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{AuthError, TokenVerifier};

const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);
/// Unknown `kid`s trigger a refetch at most this often.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const LEEWAY_SECS: u64 = 60;
const MAX_UID_LEN: usize = 128;

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    iat: i64,
    #[serde(default)]
    auth_time: Option<i64>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

pub struct FirebaseTokenVerifier {
    client: Client,
    project_id: String,
    jwks_url: String,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: String) -> Result<Self, AuthError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            project_id,
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            keys: RwLock::new(None),
        })
    }

    /// Points key fetches somewhere other than Google (`FIREBASE_JWKS_URL`).
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation.leeway = LEEWAY_SECS;
        validation
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref().filter(|c| c.is_fresh()) {
                if let Some(jwk) = cached.keys.find(kid) {
                    return Ok(DecodingKey::from_jwk(jwk)?);
                }
                if cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL {
                    return Err(AuthError::UnknownKey(kid.to_string()));
                }
            }
        }

        let fresh = self.fetch_keys().await?;
        let key = fresh.keys.find(kid).map(DecodingKey::from_jwk).transpose()?;
        *self.keys.write().await = Some(fresh);

        key.ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AuthError> {
        debug!("Fetching signing keys from {}", self.jwks_url);

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?;

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEY_TTL);

        let keys: JwkSet = response.json().await?;
        info!(
            "Loaded {} signing keys (refresh in {}s)",
            keys.keys.len(),
            ttl.as_secs()
        );

        Ok(CachedKeys {
            keys,
            fetched_at: Instant::now(),
            ttl,
        })
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Malformed("missing kid".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let data = decode::<FirebaseClaims>(token, &key, &self.validation())?;
        check_claims(&data.claims, Utc::now().timestamp())?;

        Ok(data.claims.sub)
    }
}

/// Checks the claims `jsonwebtoken` does not validate itself.
fn check_claims(claims: &FirebaseClaims, now: i64) -> Result<(), AuthError> {
    let latest = now + LEEWAY_SECS as i64;
    if claims.sub.is_empty() {
        return Err(AuthError::InvalidClaims("empty subject"));
    }
    if claims.sub.len() > MAX_UID_LEN {
        return Err(AuthError::InvalidClaims("subject too long"));
    }
    if claims.iat > latest {
        return Err(AuthError::InvalidClaims("issued in the future"));
    }
    if claims.auth_time.is_some_and(|t| t > latest) {
        return Err(AuthError::InvalidClaims("authenticated in the future"));
    }
    Ok(())
}

/// Reads `max-age` out of a `Cache-Control` header value.
fn parse_max_age(value: &str) -> Option<Duration> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs)
}
