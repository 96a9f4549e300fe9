// ABOUTME: Refresh client performing the provider token-refresh exchange
// ABOUTME: Single-attempt form-urlencoded POST with a bounded timeout, no retry policy

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        provider::Provider,
        types::{RefreshedCredential, TokenResponse},
    },
};

/// Bound on the refresh HTTP exchange. A timeout surfaces as `RefreshFailed`.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam for the provider token-refresh exchange.
///
/// The caller is responsible for ensuring `refresh_token` is non-empty;
/// implementations do not re-validate it.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(
        &self,
        provider: Provider,
        refresh_token: &str,
    ) -> AuthResult<RefreshedCredential>;
}

/// Refresh client backed by the provider's real token endpoint.
pub struct HttpRefreshClient {
    client: Client,
}

impl HttpRefreshClient {
    pub fn new() -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(REFRESH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TokenRefresher for HttpRefreshClient {
    async fn refresh(
        &self,
        provider: Provider,
        refresh_token: &str,
    ) -> AuthResult<RefreshedCredential> {
        let client_id = provider.client_id()?;
        let client_secret = provider.client_secret()?;

        debug!("Refreshing {} access token", provider);

        let response = self
            .client
            .post(provider.token_url())
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = provider_error_message(&body, status);
            // Don't log the response body - it can echo the refresh token back
            error!("Token refresh failed with status {}", status);
            return Err(AuthError::RefreshFailed(reason));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            AuthError::RefreshFailed(format!("failed to parse token response: {}", e))
        })?;

        Ok(RefreshedCredential {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_at: Utc::now().timestamp() + token_response.expires_in,
            token_type: token_response.token_type,
            scope: token_response.scope,
        })
    }
}

/// Extract a diagnostic message from an OAuth error response body.
///
/// Prefers `error_description`, then `error`, falling back to the HTTP status.
fn provider_error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(description) = value.get("error_description").and_then(|v| v.as_str()) {
            return description.to_string();
        }
        if let Some(code) = value.get("error").and_then(|v| v.as_str()) {
            return code.to_string();
        }
    }

    status
        .canonical_reason()
        .map(|r| r.to_string())
        .unwrap_or_else(|| status.to_string())
}
