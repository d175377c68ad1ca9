//! Auth backend client: login, registration, Google token exchange, logout.
//!
//! ARCHITECTURE
//! ============
//! The backend is the service of record for users and tokens. This module is
//! the only place that speaks its HTTP dialect; everything above it works with
//! `TokenResponse` and `BackendError`. The `AuthBackend` trait is the seam
//! that route and projector tests mock out.
//!
//! Every call is a single attempt. Nothing here retries.

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::BackendTimeouts;

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const GOOGLE_PATH: &str = "/api/auth/google";
const LOGOUT_PATH: &str = "/api/auth/logout";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced an HTTP response.
    #[error("backend unreachable: {0}")]
    Network(String),
    /// The backend answered with a non-success status.
    #[error("backend rejected request: status {status}")]
    Rejected { status: u16 },
    /// A success response whose body was not the expected JSON.
    #[error("backend response decode failed: {0}")]
    Decode(String),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub device_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub device_name: String,
}

#[derive(Serialize)]
struct GoogleExchangeRequest<'a> {
    access_token: &'a str,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh: &'a str,
}

/// User object as serialized by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendUser {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Body returned by login, register and Google exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<BackendUser>,
    /// Device session id; only the login endpoint sends it.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Backend user ids are integers today, but accept strings too.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// `POST /api/auth/login`.
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, BackendError>;

    /// `POST /api/auth/register`.
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, BackendError>;

    /// `POST /api/auth/google`: trade a Google access token for backend tokens.
    async fn exchange_google(&self, provider_access_token: &str) -> Result<TokenResponse, BackendError>;

    /// `POST /api/auth/logout`: revoke the device session behind `refresh_token`.
    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), BackendError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// Build an HTTP client carrying the configured connect/request timeouts.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client(timeouts: BackendTimeouts) -> Result<reqwest::Client, BackendError> {
    let mut builder = reqwest::Client::builder().connect_timeout(timeouts.connect);
    if let Some(request) = timeouts.request {
        builder = builder.timeout(request);
    }
    builder.build().map_err(|e| BackendError::Network(e.to_string()))
}

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeouts: BackendTimeouts) -> Result<Self, BackendError> {
        let http = http_client(timeouts)?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying client, shared with the Google token exchange.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_for_tokens<B>(&self, path: &str, body: &B) -> Result<TokenResponse, BackendError>
    where
        B: Serialize + Sync,
    {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::debug!(%status, path, detail, "backend rejected auth request");
            return Err(BackendError::Rejected { status: status.as_u16() });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthBackend for BackendClient {
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, BackendError> {
        self.post_for_tokens(LOGIN_PATH, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, BackendError> {
        self.post_for_tokens(REGISTER_PATH, request).await
    }

    async fn exchange_google(&self, provider_access_token: &str) -> Result<TokenResponse, BackendError> {
        self.post_for_tokens(GOOGLE_PATH, &GoogleExchangeRequest { access_token: provider_access_token })
            .await
    }

    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), BackendError> {
        let resp = self
            .http
            .post(self.url(LOGOUT_PATH))
            .bearer_auth(access_token)
            .json(&LogoutRequest { refresh: refresh_token })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Rejected { status: status.as_u16() })
        }
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
