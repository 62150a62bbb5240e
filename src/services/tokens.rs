// SPDX-License-Identifier: MIT

//! OAuth token lifecycle shared by the activity-import and calendar-export
//! connectors.
//!
//! Each provider owns one [`TokenManager`]: it hydrates the stored token
//! triple from the local cache at construction, hands out a valid access
//! token (refreshing transparently when the stored one is about to
//! expire), and clears state when a refresh is rejected so the user is
//! sent back through authorization.

use tokio::sync::RwLock;

use crate::db::FileCache;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Margin before expiry at which we refresh instead of using the stored
/// token (60 seconds).
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Stored token triple for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix epoch seconds.
    pub expires_at: i64,
}

impl TokenSet {
    /// True if the access token is still usable `margin_secs` from now.
    pub fn valid_for(&self, now: i64, margin_secs: i64) -> bool {
        now + margin_secs < self.expires_at
    }
}

/// Provider-side token operations. Implemented by each provider's API
/// client; mocked in tests.
pub trait TokenExchange {
    /// Exchange an authorization code for a token triple.
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<TokenSet, AppError>> + Send;

    /// Exchange a refresh token for a fresh triple.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<TokenSet, AppError>> + Send;
}

/// Token lifecycle for one provider.
pub struct TokenManager<E> {
    provider: &'static str,
    cache: FileCache,
    tokens: RwLock<Option<TokenSet>>,
    exchange: E,
}

impl<E: TokenExchange> TokenManager<E> {
    /// Create a manager, hydrating any stored token triple from the cache.
    pub fn new(provider: &'static str, cache: FileCache, exchange: E) -> Self {
        let stored = cache.load_tokens(provider);
        if stored.is_some() {
            tracing::debug!(provider, "Hydrated stored tokens");
        }
        Self {
            provider,
            cache,
            tokens: RwLock::new(stored),
            exchange,
        }
    }

    /// True iff a token triple is present. Does not imply it is still valid.
    pub async fn is_connected(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Exchange an authorization code and persist the resulting triple.
    pub async fn handle_callback(&self, code: &str) -> Result<(), AppError> {
        let tokens = self.exchange.exchange_code(code).await?;
        self.store(tokens).await;
        tracing::info!(provider = self.provider, "Authorization complete, tokens stored");
        Ok(())
    }

    /// Return a valid access token, refreshing first when the stored one
    /// expires within [`TOKEN_EXPIRY_MARGIN_SECS`].
    ///
    /// A failed refresh clears the stored tokens: the provider has
    /// rejected our refresh token, so only a new authorization can help.
    pub async fn get_valid_token(&self) -> Result<String, AppError> {
        // Write lock for the whole check-then-refresh so concurrent calls
        // cannot trigger duplicate refresh exchanges.
        let mut guard = self.tokens.write().await;

        let current = guard
            .as_ref()
            .ok_or(AppError::NotConnected(self.provider))?;

        let now = chrono::Utc::now().timestamp();
        if current.valid_for(now, TOKEN_EXPIRY_MARGIN_SECS) {
            return Ok(current.access_token.clone());
        }

        tracing::info!(provider = self.provider, "Access token expiring, refreshing");
        match self.exchange.refresh(&current.refresh_token).await {
            Ok(fresh) => {
                let access = fresh.access_token.clone();
                self.cache.store_tokens(self.provider, Some(&fresh));
                *guard = Some(fresh);
                tracing::info!(provider = self.provider, "Token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!(provider = self.provider, error = %e, "Token refresh failed, clearing tokens");
                self.cache.store_tokens(self.provider, None);
                *guard = None;
                Err(AppError::AuthRequired(self.provider))
            }
        }
    }

    /// Forget the stored tokens. Does not revoke them server-side.
    pub async fn disconnect(&self) {
        self.cache.store_tokens(self.provider, None);
        *self.tokens.write().await = None;
        tracing::info!(provider = self.provider, "Disconnected");
    }

    /// Persist a token triple (memory + cache).
    pub async fn store(&self, tokens: TokenSet) {
        self.cache.store_tokens(self.provider, Some(&tokens));
        *self.tokens.write().await = Some(tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Mock exchange that counts refresh calls and can be told to fail.
    #[derive(Clone, Default)]
    struct MockExchange {
        refreshes: Arc<AtomicU32>,
        fail_refresh: bool,
    }

    impl TokenExchange for MockExchange {
        async fn exchange_code(&self, _code: &str) -> Result<TokenSet, AppError> {
            Ok(TokenSet {
                access_token: "exchanged_access".to_string(),
                refresh_token: "exchanged_refresh".to_string(),
                expires_at: chrono::Utc::now().timestamp() + 3600,
            })
        }

        async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AppError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                return Err(AppError::provider_api("mock", AppError::TOKEN_ERROR));
            }
            assert_eq!(refresh_token, "stored_refresh");
            Ok(TokenSet {
                access_token: "refreshed_access".to_string(),
                refresh_token: "rotated_refresh".to_string(),
                expires_at: chrono::Utc::now().timestamp() + 3600,
            })
        }
    }

    fn temp_cache() -> FileCache {
        FileCache::new(std::env::temp_dir().join(format!(
            "trainboard_token_test_{}.json",
            uuid::Uuid::new_v4().simple()
        )))
    }

    fn stored_tokens(expires_in_secs: i64) -> TokenSet {
        TokenSet {
            access_token: "stored_access".to_string(),
            refresh_token: "stored_refresh".to_string(),
            expires_at: chrono::Utc::now().timestamp() + expires_in_secs,
        }
    }

    #[tokio::test]
    async fn test_valid_token_returned_without_refresh() {
        let exchange = MockExchange::default();
        let refreshes = exchange.refreshes.clone();
        let manager = TokenManager::new("mock", temp_cache(), exchange);
        manager.store(stored_tokens(3600)).await;

        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "stored_access");
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expiring_token_triggers_exactly_one_refresh() {
        let exchange = MockExchange::default();
        let refreshes = exchange.refreshes.clone();
        let manager = TokenManager::new("mock", temp_cache(), exchange);
        // 30 seconds left: inside the 60-second margin
        manager.store(stored_tokens(30)).await;

        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "refreshed_access");
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        // Second call uses the refreshed token; no further exchange.
        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "refreshed_access");
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_tokens() {
        let cache = temp_cache();
        let exchange = MockExchange {
            fail_refresh: true,
            ..Default::default()
        };
        let manager = TokenManager::new("mock", cache.clone(), exchange);
        manager.store(stored_tokens(30)).await;

        let err = manager.get_valid_token().await.unwrap_err();
        assert!(matches!(err, AppError::AuthRequired(_)));

        // Both memory and durable storage are cleared.
        assert!(!manager.is_connected().await);
        assert!(cache.load_tokens("mock").is_none());

        // A further call reports not-connected, not another refresh attempt.
        let err = manager.get_valid_token().await.unwrap_err();
        assert!(matches!(err, AppError::NotConnected(_)));
        cache.clear();
    }

    #[tokio::test]
    async fn test_hydrates_from_cache_at_construction() {
        let cache = temp_cache();
        let tokens = stored_tokens(3600);
        cache.store_tokens("mock", Some(&tokens));

        let manager = TokenManager::new("mock", cache.clone(), MockExchange::default());
        assert!(manager.is_connected().await);
        assert_eq!(manager.get_valid_token().await.unwrap(), "stored_access");
        cache.clear();
    }

    #[tokio::test]
    async fn test_disconnect_clears_without_revoking() {
        let cache = temp_cache();
        let manager = TokenManager::new("mock", cache.clone(), MockExchange::default());
        manager.store(stored_tokens(3600)).await;

        manager.disconnect().await;
        assert!(!manager.is_connected().await);
        assert!(cache.load_tokens("mock").is_none());
        cache.clear();
    }

    #[tokio::test]
    async fn test_callback_stores_exchanged_tokens() {
        let cache = temp_cache();
        let manager = TokenManager::new("mock", cache.clone(), MockExchange::default());

        manager.handle_callback("auth_code").await.unwrap();
        assert!(manager.is_connected().await);
        assert_eq!(
            cache.load_tokens("mock").unwrap().access_token,
            "exchanged_access"
        );
        cache.clear();
    }
}
