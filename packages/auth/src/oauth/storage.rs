// ABOUTME: Database storage layer for OAuth token records using SQLx
// ABOUTME: Confines the legacy dual-slot column aliasing behind read/write adapters

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, error};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{provider::Provider, types::TokenRecord},
};

/// Token store over a SQLite pool.
///
/// Rows carry two storage slots per credential: the primary
/// `access_token`/`refresh_token` columns and the legacy
/// `google_access_token`/`google_refresh_token` columns left over from the
/// pre-migration schema. Reads prefer the primary slot and fall back to the
/// legacy one; writes fill both so either reader generation keeps working
/// during the migration window. Nothing outside this module sees the split.
pub struct TokenStore {
    pool: SqlitePool,
}

impl TokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the oauth_tokens table if it does not exist yet.
    pub async fn ensure_schema(&self) -> AuthResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS oauth_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                access_token TEXT,
                refresh_token TEXT,
                google_access_token TEXT,
                google_refresh_token TEXT,
                expires_at INTEGER,
                token_type TEXT NOT NULL DEFAULT 'Bearer',
                scope TEXT,
                account_email TEXT,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
                UNIQUE(user_id, provider)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the token record for a user and provider, if one exists.
    pub async fn get_token(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> AuthResult<Option<TokenRecord>> {
        debug!(
            "Fetching OAuth token for user {} provider {}",
            user_id, provider
        );

        let row = sqlx::query(
            r#"
            SELECT id, user_id, provider, access_token, refresh_token,
                   google_access_token, google_refresh_token,
                   expires_at, token_type, scope, account_email
            FROM oauth_tokens
            WHERE user_id = ? AND provider = ?
            "#,
        )
        .bind(user_id)
        .bind(provider.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let record = row_to_record(&row)?;
                debug!("Found OAuth token record");
                Ok(Some(record))
            }
            None => {
                debug!("No OAuth token found");
                Ok(None)
            }
        }
    }

    /// Store a token record via an idempotent upsert keyed by (user_id, provider).
    ///
    /// The access token and its expiry are always replaced together in the
    /// single-row write. The refresh token is update-only: if the incoming
    /// record carries no refresh credential, the stored one survives. The
    /// guard applies the same empty-as-absent rule to both slots that reads
    /// do, and lives in the SQL so no caller can lose a refresh token by
    /// persisting a provider response that omitted one.
    pub async fn store_token(&self, record: &TokenRecord) -> AuthResult<()> {
        debug!(
            "Storing OAuth token for user {} provider {}",
            record.user_id, record.provider
        );

        sqlx::query(
            r#"
            INSERT INTO oauth_tokens (
                id, user_id, provider, access_token, refresh_token,
                google_access_token, google_refresh_token,
                expires_at, token_type, scope, account_email,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, unixepoch(), unixepoch())
            ON CONFLICT(user_id, provider) DO UPDATE SET
                access_token = excluded.access_token,
                google_access_token = excluded.access_token,
                refresh_token = CASE
                    WHEN excluded.refresh_token IS NULL OR excluded.refresh_token = ''
                    THEN COALESCE(NULLIF(oauth_tokens.refresh_token, ''), NULLIF(oauth_tokens.google_refresh_token, ''))
                    ELSE excluded.refresh_token
                END,
                google_refresh_token = CASE
                    WHEN excluded.refresh_token IS NULL OR excluded.refresh_token = ''
                    THEN COALESCE(NULLIF(oauth_tokens.refresh_token, ''), NULLIF(oauth_tokens.google_refresh_token, ''))
                    ELSE excluded.refresh_token
                END,
                expires_at = excluded.expires_at,
                token_type = excluded.token_type,
                scope = excluded.scope,
                account_email = excluded.account_email,
                updated_at = unixepoch()
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.provider)
        .bind(&record.access_token)
        .bind(&record.refresh_token)
        .bind(&record.access_token)
        .bind(&record.refresh_token)
        .bind(record.expires_at)
        .bind(&record.token_type)
        .bind(&record.scope)
        .bind(&record.account_email)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to store OAuth token: {}", e);
            AuthError::Storage(format!("Failed to store token: {}", e))
        })?;

        debug!("Successfully stored OAuth token");
        Ok(())
    }
}

/// Map a row to a record, collapsing the dual storage slots to one logical field.
fn row_to_record(row: &SqliteRow) -> AuthResult<TokenRecord> {
    let access_token: Option<String> = row.try_get("access_token")?;
    let legacy_access_token: Option<String> = row.try_get("google_access_token")?;
    let refresh_token: Option<String> = row.try_get("refresh_token")?;
    let legacy_refresh_token: Option<String> = row.try_get("google_refresh_token")?;

    Ok(TokenRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        provider: row.try_get("provider")?,
        access_token: coalesce_slot(access_token, legacy_access_token).unwrap_or_default(),
        refresh_token: coalesce_slot(refresh_token, legacy_refresh_token),
        expires_at: row.try_get("expires_at")?,
        token_type: row.try_get("token_type")?,
        scope: row.try_get("scope")?,
        account_email: row.try_get("account_email")?,
    })
}

/// Prefer the primary slot, falling back to the legacy slot; empty strings
/// count as absent.
fn coalesce_slot(primary: Option<String>, legacy: Option<String>) -> Option<String> {
    primary
        .filter(|s| !s.is_empty())
        .or_else(|| legacy.filter(|s| !s.is_empty()))
}
