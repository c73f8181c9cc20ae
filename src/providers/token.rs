//! Bearer-token cache for authenticated providers.
//!
//! One `TokenCache` is owned by each authenticated client. Reads take a
//! shared lock; a refresh holds a separate async mutex for its whole
//! duration, so concurrent callers that find the token stale wait for the
//! single in-flight refresh instead of issuing their own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

use super::ProviderResult;

// ---

/// Tokens are treated as expired this long before the issuer says so.
const EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

/// Token as returned by an OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Source of fresh tokens.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> ProviderResult<IssuedToken>;
}

/// OAuth2 client-credentials grant.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenFetcher for ClientCredentials {
    async fn fetch_token(&self) -> ProviderResult<IssuedToken> {
        // ---
        debug!(url = %self.token_url, "Requesting access token");

        let token = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<IssuedToken>()
            .await?;

        Ok(token)
    }
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

pub struct TokenCache {
    fetcher: Arc<dyn TokenFetcher>,
    cached: RwLock<Option<CachedToken>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            fetcher,
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return a non-expired token, refreshing it at most once at a time.
    pub async fn get_valid_token(&self) -> ProviderResult<String> {
        // ---
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let _refreshing = self.refresh.lock().await;

        // whoever held the lock before us may already have refreshed
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let issued = self.fetcher.fetch_token().await?;
        let lifetime = Duration::from_secs(issued.expires_in).saturating_sub(EXPIRY_LEEWAY);
        debug!(lifetime_secs = lifetime.as_secs(), "Access token refreshed");

        *self.cached.write().await = Some(CachedToken {
            token: issued.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(issued.access_token)
    }

    /// Drop the cached token, e.g. after the provider rejected it.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn current(&self) -> Option<String> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|c| Instant::now() < c.expires_at)
            .map(|c| c.token.clone())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::ProviderError;

    struct CountingFetcher {
        calls: AtomicU32,
        expires_in: u64,
        fail: bool,
    }

    impl CountingFetcher {
        fn new(expires_in: u64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                expires_in,
                fail: false,
            })
        }
    }

    #[async_trait]
    impl TokenFetcher for CountingFetcher {
        async fn fetch_token(&self) -> ProviderResult<IssuedToken> {
            // ---
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail {
                return Err(ProviderError::MissingCredentials("test"));
            }
            Ok(IssuedToken {
                access_token: format!("token-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_is_reused_until_expiry() {
        // ---
        let fetcher = CountingFetcher::new(120);
        let cache = TokenCache::new(fetcher.clone());

        assert_eq!(cache.get_valid_token().await.unwrap(), "token-1");
        assert_eq!(cache.get_valid_token().await.unwrap(), "token-1");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        // 120s lifetime minus 60s leeway
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get_valid_token().await.unwrap(), "token-2");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_refresh() {
        // ---
        let fetcher = CountingFetcher::new(3600);
        let cache = Arc::new(TokenCache::new(fetcher.clone()));

        let calls = (0..16).map(|_| {
            let cache = Arc::clone(&cache);
            async move { cache.get_valid_token().await }
        });
        let tokens = futures::future::join_all(calls).await;

        assert!(tokens.iter().all(|t| t.as_deref().ok() == Some("token-1")));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refresh() {
        // ---
        let fetcher = CountingFetcher::new(3600);
        let cache = TokenCache::new(fetcher.clone());

        cache.get_valid_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.get_valid_token().await.unwrap(), "token-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_is_not_cached() {
        // ---
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicU32::new(0),
            expires_in: 3600,
            fail: true,
        });
        let cache = TokenCache::new(fetcher.clone());

        assert!(cache.get_valid_token().await.is_err());
        assert!(cache.get_valid_token().await.is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
