// ABOUTME: Error types for OAuth token lifecycle operations
// ABOUTME: Distinguishes the user-actionable failure kinds callers map to reconnect UX

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No token record exists for this user/provider pair.
    /// Caller action: initiate OAuth consent.
    #[error("not connected: {0}")]
    NotConnected(String),

    /// A record exists but carries no usable refresh credential.
    /// Caller action: force re-consent (prompt=consent).
    #[error("missing refresh token: {0}")]
    MissingRefreshToken(String),

    /// The provider rejected or failed the refresh exchange. The reason
    /// string is diagnostic only, not guaranteed stable.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
