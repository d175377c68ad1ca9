//! Session projector: folds fresh sign-ins into the session token.
//!
//! DESIGN
//! ======
//! The session token is the only session state there is; it lives in the
//! client's encrypted cookie. Each refresh applies two merge points in fixed
//! order:
//!
//! 1. a freshly exchanged `IdentityRecord` (credential sign-in) is copied in;
//! 2. if the active account is Google, the backend token bridge runs and its
//!    result overwrites the same fields.
//!
//! When neither fires the stored values persist untouched; only the expiry
//! rolls forward. A bridge failure aborts the whole refresh.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::backend::AuthBackend;
use super::identity::IdentityRecord;
use super::oauth::{self, BridgeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl From<&IdentityRecord> for SessionUser {
    fn from(identity: &IdentityRecord) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            avatar: identity.avatar.clone(),
        }
    }
}

/// Persisted session state. Serialized into the encrypted session cookie.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
    /// Unix seconds of the last successful exchange.
    #[serde(default)]
    pub issued_at: i64,
    /// Unix seconds after which the token is ignored.
    #[serde(default)]
    pub expires_at: i64,
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("user", &self.user)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// What the UI is allowed to see of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<SessionUser>,
}

impl SessionToken {
    /// The route guard's only question.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now.unix_timestamp()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user: self.user.clone(),
        }
    }

    fn apply(&mut self, identity: &IdentityRecord, now: OffsetDateTime) {
        self.access_token = Some(identity.access_token.clone());
        self.refresh_token = Some(identity.refresh_token.clone());
        self.user = Some(SessionUser::from(identity));
        self.issued_at = now.unix_timestamp();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Credentials,
    Google,
}

/// The account a sign-in came through.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub provider: Provider,
    /// Provider-issued access token. Discarded once bridged.
    pub access_token: Option<String>,
}

impl Account {
    #[must_use]
    pub fn google(access_token: String) -> Self {
        Self { provider: Provider::Google, access_token: Some(access_token) }
    }
}

/// Everything one refresh needs, passed explicitly.
pub struct SessionRefresh<'a> {
    /// Token decoded from the cookie, or `SessionToken::default()` on first sign-in.
    pub token: SessionToken,
    /// Set right after a credential exchange.
    pub identity: Option<&'a IdentityRecord>,
    /// Set right after a provider sign-in.
    pub account: Option<&'a Account>,
    pub now: OffsetDateTime,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProjectError {
    #[error("oauth token bridge failed: {0}")]
    OAuthBridge(#[from] BridgeError),
}

/// Apply both merge points and roll the expiry to `now + max_age`.
///
/// # Errors
///
/// Returns `ProjectError::OAuthBridge` when the Google account cannot be
/// traded for backend tokens. The caller must not persist anything then.
pub async fn refresh_token(
    backend: &dyn AuthBackend,
    refresh: SessionRefresh<'_>,
    max_age: Duration,
) -> Result<SessionToken, ProjectError> {
    let SessionRefresh { mut token, identity, account, now } = refresh;

    if let Some(identity) = identity {
        token.apply(identity, now);
    }

    if let Some(account) = account.filter(|a| a.provider == Provider::Google) {
        let provider_token = account.access_token.as_deref().unwrap_or_default();
        let identity = oauth::bridge(backend, provider_token).await?;
        token.apply(&identity, now);
    }

    token.expires_at = (now + max_age).unix_timestamp();
    Ok(token)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
