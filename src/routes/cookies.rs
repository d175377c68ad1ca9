//! Session and OAuth-state cookies.
//!
//! Both live in a `PrivateCookieJar`, so their values are encrypted and
//! authenticated with the key derived from `SESSION_SECRET`. A cookie that
//! fails to decrypt simply does not show up in that jar, so clearing goes
//! through a plain `CookieJar`, which still sees every cookie the browser sent.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, PrivateCookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use crate::services::session::SessionToken;

pub const SESSION_COOKIE: &str = "session_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_MAX_AGE: Duration = Duration::minutes(10);

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("session cookie payload invalid: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("session expired")]
    Expired,
}

/// Decode the session token from the jar. `Ok(None)` when there is no cookie.
///
/// # Errors
///
/// Returns an error if the decrypted payload is not a token or has expired.
pub fn decode_session(jar: &PrivateCookieJar, now: OffsetDateTime) -> Result<Option<SessionToken>, CookieError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let token: SessionToken = serde_json::from_str(cookie.value())?;
    if token.is_expired(now) {
        return Err(CookieError::Expired);
    }
    Ok(Some(token))
}

/// Like `decode_session`, but any unreadable token counts as no session.
#[must_use]
pub fn read_session(jar: &PrivateCookieJar, now: OffsetDateTime) -> Option<SessionToken> {
    decode_session(jar, now).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "ignoring unreadable session cookie");
        None
    })
}

/// Store `token` in the session cookie.
///
/// # Errors
///
/// Returns an error if the token cannot be serialized.
pub fn write_session(
    jar: PrivateCookieJar,
    token: &SessionToken,
    max_age: Duration,
    secure: bool,
) -> Result<PrivateCookieJar, CookieError> {
    let value = serde_json::to_string(token)?;
    let cookie = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age);
    Ok(jar.add(cookie))
}

/// Expire the session cookie if the request carried one, readable or not.
#[must_use]
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

#[must_use]
pub fn set_oauth_state(jar: PrivateCookieJar, state: String, secure: bool) -> PrivateCookieJar {
    let cookie = Cookie::build((OAUTH_STATE_COOKIE, state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(OAUTH_STATE_MAX_AGE);
    jar.add(cookie)
}

#[must_use]
pub fn oauth_state(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}

#[must_use]
pub fn clear_oauth_state(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"))
}

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// The decoded session, if any. Never rejects; handlers decide what a missing
/// session means for them.
pub struct CurrentSession(pub Option<SessionToken>);

impl CurrentSession {
    /// The token, but only when it carries a user.
    #[must_use]
    pub fn authenticated(self) -> Option<SessionToken> {
        self.0.filter(SessionToken::is_authenticated)
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, Key::from_ref(state));
        Ok(Self(read_session(&jar, OffsetDateTime::now_utc())))
    }
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
