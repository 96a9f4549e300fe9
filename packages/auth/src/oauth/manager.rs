// ABOUTME: Token manager orchestrating lookup, expiry check, refresh, and persistence
// ABOUTME: Serializes refreshes per (user, provider) so concurrent callers share one exchange

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        expiry::{is_expired, DEFAULT_SKEW_SECS},
        provider::Provider,
        refresh::{HttpRefreshClient, TokenRefresher},
        storage::TokenStore,
        types::TokenRecord,
    },
};

/// Token manager for the OAuth access-token lifecycle.
///
/// Per request the state machine is: FRESH (return the stored record
/// unchanged), EXPIRED_REFRESHABLE (one refresh exchange, persist, return),
/// or EXPIRED_UNREFRESHABLE (terminal, user must re-consent).
pub struct TokenManager {
    store: TokenStore,
    refresher: Arc<dyn TokenRefresher>,
    // One lock per (user, provider) key; at most one in-flight refresh each.
    refresh_locks: Mutex<HashMap<(String, Provider), Arc<Mutex<()>>>>,
}

impl TokenManager {
    /// Create a new token manager with a database pool
    pub fn new(pool: SqlitePool) -> AuthResult<Self> {
        let refresher = Arc::new(HttpRefreshClient::new()?);
        Ok(Self::with_refresher(pool, refresher))
    }

    /// Create a token manager with an injected refresh client
    pub fn with_refresher(pool: SqlitePool, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            store: TokenStore::new(pool),
            refresher,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a new token manager with the default database location
    pub async fn new_default() -> AuthResult<Self> {
        let db_path = dirs::home_dir()
            .ok_or_else(|| {
                AuthError::Configuration("Could not determine home directory".to_string())
            })?
            .join(".dealdesk")
            .join("dealdesk.db");

        let database_url = format!("sqlite:{}", db_path.display());

        let pool = sqlx::SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to connect to database: {}", e)))?;

        Self::new(pool)
    }

    /// Get the underlying token store (used by the consent flow to persist
    /// the initial grant)
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Ensure a usable Google access token for this user.
    ///
    /// This is the contract consumed by the Calendar, Gmail, and Contacts
    /// integrations before any authorized API call.
    pub async fn ensure_google_access_token(&self, user_id: &str) -> AuthResult<TokenRecord> {
        self.ensure_access_token(user_id, Provider::Google).await
    }

    /// Ensure a usable access token for this user and provider.
    ///
    /// Returns the stored record unchanged when it is still fresh; otherwise
    /// performs one refresh exchange and persists the result before
    /// returning. All failures are terminal for the current request: no
    /// retries and no fallback to a stale token. Callers map the error kinds
    /// to reconnect UX.
    pub async fn ensure_access_token(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> AuthResult<TokenRecord> {
        // Serialize per (user, provider). A caller that waited here re-reads
        // the store below and usually finds the token its predecessor just
        // refreshed, so only one provider exchange happens per expiry.
        let lock = self.refresh_lock(user_id, provider).await;
        let result = {
            let _guard = lock.lock().await;
            self.ensure_access_token_locked(user_id, provider).await
        };
        self.release_refresh_lock(user_id, provider, &lock).await;
        result
    }

    async fn ensure_access_token_locked(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> AuthResult<TokenRecord> {
        let record = self
            .store
            .get_token(user_id, provider)
            .await?
            .ok_or_else(|| {
                AuthError::NotConnected(format!(
                    "no {} tokens found for this user; please reconnect",
                    provider
                ))
            })?;

        if record.access_token.is_empty() && !record.has_refresh_token() {
            return Err(AuthError::MissingRefreshToken(format!(
                "stored {} credentials are unusable; user must re-authenticate",
                provider
            )));
        }

        let now = Utc::now().timestamp();
        if !record.access_token.is_empty()
            && !is_expired(record.expires_at, now, DEFAULT_SKEW_SECS)
        {
            debug!("Access token for {} is still fresh", provider);
            return Ok(record);
        }

        let refresh_token = record.refresh_token.clone().filter(|rt| !rt.is_empty());
        let Some(refresh_token) = refresh_token else {
            return Err(AuthError::MissingRefreshToken(format!(
                "{} access token expired and no refresh token is stored; user must re-authenticate",
                provider
            )));
        };

        info!("Access token for {} expired, refreshing", provider);
        let refreshed = self.refresher.refresh(provider, &refresh_token).await?;

        // Full replace of the credential fields: access token and expiry move
        // together, and a provider response without a refresh token keeps the
        // one we already hold.
        let new_record = TokenRecord {
            id: record.id,
            user_id: record.user_id,
            provider: record.provider,
            access_token: refreshed.access_token,
            refresh_token: refreshed
                .refresh_token
                .filter(|rt| !rt.is_empty())
                .or(Some(refresh_token)),
            expires_at: Some(refreshed.expires_at),
            token_type: refreshed.token_type.unwrap_or(record.token_type),
            scope: refreshed.scope.or(record.scope),
            account_email: record.account_email,
        };

        self.store.store_token(&new_record).await?;

        info!("✅ Successfully refreshed {} token", provider);
        Ok(new_record)
    }

    /// Check connection status for all providers
    pub async fn connection_status(&self, user_id: &str) -> AuthResult<Vec<ProviderStatus>> {
        let now = Utc::now().timestamp();
        let mut statuses = Vec::new();

        for provider in Provider::all() {
            let token = self.store.get_token(user_id, provider).await?;

            let status = match token {
                Some(token) => ProviderStatus {
                    provider,
                    connected: !token.access_token.is_empty()
                        && !is_expired(token.expires_at, now, DEFAULT_SKEW_SECS),
                    expires_at: token.expires_at,
                    account_email: token.account_email,
                },
                None => ProviderStatus {
                    provider,
                    connected: false,
                    expires_at: None,
                    account_email: None,
                },
            };

            statuses.push(status);
        }

        Ok(statuses)
    }

    async fn refresh_lock(&self, user_id: &str, provider: Provider) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry((user_id.to_string(), provider))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map entry for a key once no caller holds or waits on it, so
    /// the lock map does not grow one entry per user forever.
    async fn release_refresh_lock(&self, user_id: &str, provider: Provider, lock: &Arc<Mutex<()>>) {
        let mut locks = self.refresh_locks.lock().await;
        // Two strong references left (the map's and this caller's) means no
        // other caller can be waiting; clones are only handed out under the
        // map lock held here.
        if Arc::strong_count(lock) == 2 {
            locks.remove(&(user_id.to_string(), provider));
        }
    }
}

/// Provider connection status
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub connected: bool,
    pub expires_at: Option<i64>,
    pub account_email: Option<String>,
}
