//! Google OAuth service: authorize URL, code exchange, backend token bridge.
//!
//! ARCHITECTURE
//! ============
//! Google only proves who the user is. Once the provider access token is in
//! hand, `bridge` trades it with the backend for backend-issued tokens, and
//! from then on the backend is the sole source of session credentials. The
//! provider token is dropped after the trade.

use std::fmt::Write;

use rand::Rng;

use super::backend::{AuthBackend, BackendError};
use super::identity::{IdentityError, IdentityRecord};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_SCOPES: &str = "openid email profile";

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Random 32-byte hex value for the OAuth `state` parameter.
#[must_use]
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Google OAuth configuration loaded from environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
}

impl GoogleConfig {
    /// Load from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`.
    /// Returns `None` if any are missing (Google sign-in will be disabled).
    ///
    /// `GOOGLE_AUTH_URL` and `GOOGLE_TOKEN_URL` override the public endpoints.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok()?;
        let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI").ok()?;
        Some(Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: std::env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| GOOGLE_AUTH_URL.to_string()),
            token_url: std::env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| GOOGLE_TOKEN_URL.to_string()),
        })
    }

    /// Build the Google authorization URL carrying the CSRF `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured auth URL is not a valid URL.
    pub fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let url = reqwest::Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("prompt", "consent"),
                ("access_type", "offline"),
                ("state", state),
            ],
        )
        .map_err(|e| OAuthError::Config(e.to_string()))?;
        Ok(url.into())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OAuthError {
    #[error("invalid google oauth config: {0}")]
    Config(String),
    #[error("google token exchange failed: {0}")]
    TokenExchange(String),
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange an authorization code for the Google access token.
///
/// # Errors
///
/// Returns an error if Google is unreachable, refuses the code, or answers
/// with an unexpected body.
pub async fn exchange_code(http: &reqwest::Client, config: &GoogleConfig, code: &str) -> Result<String, OAuthError> {
    let resp = http
        .post(&config.token_url)
        .header("Accept", "application/json")
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;
    if !status.is_success() {
        return Err(OAuthError::TokenExchange(format!("{status}: {body}")));
    }

    let token_resp: TokenResponse = serde_json::from_str(&body)
        .map_err(|_| OAuthError::TokenExchange(format!("unexpected response: {body}")))?;
    Ok(token_resp.access_token)
}

// =============================================================================
// BACKEND TOKEN BRIDGE
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("provider account carries no access token")]
    MissingProviderToken,
    #[error("backend google exchange failed: {0}")]
    Backend(#[from] BackendError),
    #[error("backend google exchange incomplete: {0}")]
    Identity(#[from] IdentityError),
}

/// Trade a Google access token for backend tokens and the backend's user.
///
/// # Errors
///
/// Any failure aborts session establishment; there is no fallback to the
/// provider profile.
pub async fn bridge(backend: &dyn AuthBackend, provider_access_token: &str) -> Result<IdentityRecord, BridgeError> {
    if provider_access_token.is_empty() {
        return Err(BridgeError::MissingProviderToken);
    }
    let resp = backend.exchange_google(provider_access_token).await?;
    Ok(IdentityRecord::try_from(resp)?)
}

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;
