// ABOUTME: OAuth module covering the access-token lifecycle for external integrations
// ABOUTME: Includes expiry policy, refresh client, token storage, and the manager

pub mod expiry;
pub mod manager;
pub mod provider;
pub mod refresh;
pub mod storage;
pub mod types;

pub use expiry::{is_expired, DEFAULT_SKEW_SECS};
pub use manager::{ProviderStatus, TokenManager};
pub use provider::Provider;
pub use refresh::{HttpRefreshClient, TokenRefresher};
pub use storage::TokenStore;
pub use types::{RefreshedCredential, TokenRecord, TokenResponse};
