use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;

use super::{IdentityClaims, IdentityError, IdentityResolver, VerifiedIdentity};
use crate::core::config::IdentitySettings;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
/// Floor between two key fetches, whatever the token claims.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Default)]
struct KeyCache {
    keys: Option<JwkSet>,
    fetched_at: Option<Instant>,
    attempted_at: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.is_some_and(|at| at.elapsed() < ttl)
    }

    fn may_refetch(&self) -> bool {
        self.attempted_at.map_or(true, |at| at.elapsed() >= MIN_REFETCH_INTERVAL)
    }

    fn key(&self, kid: &str) -> Option<Result<DecodingKey, IdentityError>> {
        self.keys.as_ref().and_then(|keys| keys.find(kid)).map(|jwk| {
            DecodingKey::from_jwk(jwk).map_err(|err| IdentityError::InvalidToken(err.to_string()))
        })
    }
}

fn unknown_key(kid: &str) -> IdentityError {
    IdentityError::InvalidToken(format!("unknown signing key {kid}"))
}

/// Verifies Firebase ID tokens against Google's published signing keys.
pub(crate) struct FirebaseResolver {
    client: reqwest::Client,
    jwks_url: String,
    project_id: String,
    issuer: String,
    ttl: Duration,
    cache: RwLock<KeyCache>,
}

impl FirebaseResolver {
    pub(crate) fn new(settings: &IdentitySettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            jwks_url: settings.jwks_url.clone(),
            project_id: settings.firebase_project_id.clone(),
            issuer: format!("{ISSUER_PREFIX}{}", settings.firebase_project_id),
            ttl: Duration::from_secs(settings.jwks_cache_ttl_seconds),
            cache: RwLock::new(KeyCache::default()),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    /// Unknown `kid`s refetch at most once per `MIN_REFETCH_INTERVAL`; other
    /// misses in that interval are rejected against the cached set.
    async fn key_for(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = Self::cached_key(&cache, kid, self.ttl) {
                return key;
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have refetched while this one waited.
        if let Some(key) = Self::cached_key(&cache, kid, self.ttl) {
            return key;
        }

        cache.attempted_at = Some(Instant::now());
        let keys = self.fetch_keys().await?;
        cache.keys = Some(keys);
        cache.fetched_at = Some(Instant::now());

        cache.key(kid).unwrap_or_else(|| Err(unknown_key(kid)))
    }

    /// `None` means a fetch is due.
    fn cached_key(
        cache: &KeyCache,
        kid: &str,
        ttl: Duration,
    ) -> Option<Result<DecodingKey, IdentityError>> {
        if cache.is_fresh(ttl) {
            if let Some(key) = cache.key(kid) {
                return Some(key);
            }
        }
        if cache.may_refetch() {
            return None;
        }
        Some(cache.key(kid).unwrap_or_else(|| Err(unknown_key(kid))))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, IdentityError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Unavailable(format!(
                "jwks endpoint returned {}",
                response.status()
            )));
        }

        let keys = response
            .json::<JwkSet>()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        tracing::debug!(keys = keys.keys.len(), "Fetched identity signing keys");
        Ok(keys)
    }
}

#[async_trait]
impl IdentityResolver for FirebaseResolver {
    async fn resolve(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let header =
            decode_header(token).map_err(|err| IdentityError::InvalidToken(err.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!("unexpected alg {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("missing kid".to_string()))?;

        let key = self.key_for(&kid).await?;
        let data = decode::<IdentityClaims>(token, &key, &self.validation())
            .map_err(|err| IdentityError::InvalidToken(err.to_string()))?;

        if data.claims.sub.trim().is_empty() {
            return Err(IdentityError::InvalidToken("empty subject".to_string()));
        }

        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> IdentitySettings {
        IdentitySettings {
            provider: crate::core::config::IdentityProvider::Firebase,
            firebase_project_id: "qbank-test".to_string(),
            jwks_url: "http://127.0.0.1:9/keys".to_string(),
            jwks_cache_ttl_seconds: 60,
            request_timeout_seconds: 1,
        }
    }

    #[tokio::test]
    async fn rejects_hs256_tokens_before_fetching_keys() {
        let resolver = FirebaseResolver::new(&settings()).expect("resolver");
        let token = crate::core::identity::mint_token(
            "secret",
            "uid-1",
            None,
            None,
            time::Duration::minutes(5),
        );

        assert!(matches!(resolver.resolve(&token).await, Err(IdentityError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn garbage_tokens_are_invalid() {
        let resolver = FirebaseResolver::new(&settings()).expect("resolver");
        assert!(matches!(resolver.resolve("abc.def").await, Err(IdentityError::InvalidToken(_))));
    }

    fn token_with_kid(kid: &str) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = serde_json::json!({ "alg": "RS256", "typ": "JWT", "kid": kid });
        let claims = serde_json::json!({ "sub": "uid-1", "aud": "qbank-test" });
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string()),
            URL_SAFE_NO_PAD.encode("not-a-signature"),
        )
    }

    #[tokio::test]
    async fn unknown_kids_refetch_at_most_once_per_interval() {
        // The key endpoint is unreachable, so only a real fetch reports Unavailable.
        let resolver = FirebaseResolver::new(&settings()).expect("resolver");

        let first = resolver.resolve(&token_with_kid("forged-1")).await;
        assert!(matches!(first, Err(IdentityError::Unavailable(_))), "got {first:?}");

        let second = resolver.resolve(&token_with_kid("forged-2")).await;
        assert!(matches!(second, Err(IdentityError::InvalidToken(_))), "got {second:?}");
    }

    #[tokio::test]
    async fn fresh_cache_rejects_unknown_kid_without_fetching() {
        let resolver = FirebaseResolver::new(&settings()).expect("resolver");
        {
            let mut cache = resolver.cache.write().await;
            let now = Instant::now();
            cache.keys = Some(JwkSet { keys: Vec::new() });
            cache.fetched_at = Some(now);
            cache.attempted_at = Some(now);
        }

        for kid in ["forged-1", "forged-2"] {
            let result = resolver.resolve(&token_with_kid(kid)).await;
            assert!(matches!(result, Err(IdentityError::InvalidToken(_))), "got {result:?}");
        }
    }

    #[test]
    fn validation_pins_audience_and_issuer() {
        let resolver = FirebaseResolver::new(&settings()).expect("resolver");
        assert_eq!(resolver.issuer, "https://securetoken.google.com/qbank-test");
        let validation = resolver.validation();
        assert!(validation.aud.as_ref().is_some_and(|aud| aud.contains("qbank-test")));
    }
}
