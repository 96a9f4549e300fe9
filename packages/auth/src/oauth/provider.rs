// ABOUTME: OAuth provider definitions for calendar/email integrations
// ABOUTME: Google is the primary provider; Microsoft exercises the multi-provider boundary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AuthError, AuthResult};

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Microsoft,
}

impl Provider {
    /// Get the token exchange URL for this provider
    pub fn token_url(&self) -> &str {
        match self {
            Self::Google => "https://oauth2.googleapis.com/token",
            Self::Microsoft => "https://login.microsoftonline.com/common/oauth2/v2.0/token",
        }
    }

    /// Get the OAuth client ID for this provider from environment variables
    pub fn client_id(&self) -> AuthResult<String> {
        let env_var = match self {
            Self::Google => "GOOGLE_OAUTH_CLIENT_ID",
            Self::Microsoft => "MICROSOFT_OAUTH_CLIENT_ID",
        };

        std::env::var(env_var)
            .map_err(|_| AuthError::Configuration(format!("{} is not set", env_var)))
    }

    /// Get the OAuth client secret for this provider from environment variables
    pub fn client_secret(&self) -> AuthResult<String> {
        let env_var = match self {
            Self::Google => "GOOGLE_OAUTH_CLIENT_SECRET",
            Self::Microsoft => "MICROSOFT_OAUTH_CLIENT_SECRET",
        };

        std::env::var(env_var)
            .map_err(|_| AuthError::Configuration(format!("{} is not set", env_var)))
    }

    /// Get all supported providers
    pub fn all() -> Vec<Self> {
        vec![Self::Google, Self::Microsoft]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Microsoft => write!(f, "microsoft"),
        }
    }
}

impl FromStr for Provider {
    type Err = AuthError;

    fn from_str(s: &str) -> AuthResult<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "microsoft" => Ok(Self::Microsoft),
            _ => Err(AuthError::Configuration(format!(
                "Unknown provider: {}. Supported: google, microsoft",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = AuthError;

    fn try_from(s: String) -> AuthResult<Self> {
        s.parse()
    }
}

impl TryFrom<&str> for Provider {
    type Error = AuthError;

    fn try_from(s: &str) -> AuthResult<Self> {
        s.parse()
    }
}
