// ABOUTME: Core type definitions for OAuth token lifecycle management
// ABOUTME: Includes the persisted token record and the provider refresh wire types

use serde::{Deserialize, Serialize};

use crate::oauth::provider::Provider;

/// OAuth token record stored in the database, one per (user_id, provider).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp. `None` means the token was never validated and must
    /// be treated as already expired.
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub scope: Option<String>,
    pub account_email: Option<String>,
}

impl TokenRecord {
    /// Create a record for a freshly granted credential.
    ///
    /// Used by the consent flow after the initial code exchange; refreshes
    /// reuse the existing row id.
    pub fn new(
        user_id: &str,
        provider: Provider,
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<i64>,
    ) -> Self {
        Self {
            id: nanoid::nanoid!(),
            user_id: user_id.to_string(),
            provider: provider.to_string(),
            access_token,
            refresh_token,
            expires_at,
            token_type: "Bearer".to_string(),
            scope: None,
            account_email: None,
        }
    }

    /// Whether this record carries a usable refresh credential.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|rt| !rt.is_empty())
    }
}

/// Token response from the provider's token endpoint.
///
/// Providers commonly omit `refresh_token` on refresh grants; the caller's
/// existing refresh credential must be preserved in that case.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64, // Seconds
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// Result of one successful refresh exchange, with expiry resolved to an
/// absolute instant.
#[derive(Debug, Clone)]
pub struct RefreshedCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp: now + expires_in at the time of the exchange.
    pub expires_at: i64,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(refresh_token: Option<&str>) -> TokenRecord {
        TokenRecord {
            id: "test-id".to_string(),
            user_id: "test-user".to_string(),
            provider: "google".to_string(),
            access_token: "test-access-token".to_string(),
            refresh_token: refresh_token.map(|s| s.to_string()),
            expires_at: Some(1_700_000_000),
            token_type: "Bearer".to_string(),
            scope: Some("https://www.googleapis.com/auth/calendar".to_string()),
            account_email: Some("agent@example.com".to_string()),
        }
    }

    #[test]
    fn test_has_refresh_token() {
        assert!(record(Some("1//refresh")).has_refresh_token());
        assert!(!record(Some("")).has_refresh_token());
        assert!(!record(None).has_refresh_token());
    }

    #[test]
    fn test_new_record_defaults() {
        let record = TokenRecord::new(
            "user-1",
            Provider::Google,
            "access".to_string(),
            Some("refresh".to_string()),
            Some(1_700_000_000),
        );

        assert!(!record.id.is_empty());
        assert_eq!(record.provider, "google");
        assert_eq!(record.token_type, "Bearer");
        assert_eq!(record.scope, None);
    }
}
