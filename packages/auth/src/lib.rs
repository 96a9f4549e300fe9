// ABOUTME: Dealdesk authentication library managing OAuth token lifecycles
// ABOUTME: Keeps Google (and Microsoft) access tokens fresh for calendar/email integrations

pub mod error;
pub mod oauth;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use oauth::{
    HttpRefreshClient, Provider, ProviderStatus, RefreshedCredential, TokenManager, TokenRecord,
    TokenRefresher, TokenResponse, TokenStore,
};
