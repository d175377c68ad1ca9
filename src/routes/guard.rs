//! Route guard middleware.
//!
//! DESIGN
//! ======
//! The guard only looks at three paths. `/sign-in` and `/sign-up` are public;
//! `/dashboard` needs a session whose token carries a user. Everything else
//! passes straight through without touching the cookie.
//!
//! The decision itself is the pure `decide` function so it can be tested
//! without a router. The middleware feeds it the session decoded from the
//! request's cookie jar, never anything global.
//!
//! Authenticated page loads re-issue the cookie with a rolled expiry. POSTs
//! are left alone: their handlers set or clear the cookie themselves.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};
use time::OffsetDateTime;

use crate::services::session::{self, SessionRefresh, SessionToken};
use crate::state::AppState;

use super::cookies;

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const SIGN_UP_PATH: &str = "/sign-up";
pub const DASHBOARD_PATH: &str = "/dashboard";

const MATCHED_PATHS: [&str; 3] = [SIGN_IN_PATH, SIGN_UP_PATH, DASHBOARD_PATH];
const PUBLIC_PATHS: [&str; 2] = [SIGN_IN_PATH, SIGN_UP_PATH];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    #[must_use]
    pub fn of(token: Option<&SessionToken>) -> Self {
        if token.is_some_and(SessionToken::is_authenticated) { Self::Authenticated } else { Self::Unauthenticated }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Path is outside the matcher.
    Bypass,
    Pass,
    RedirectToSignIn,
}

#[must_use]
pub fn decide(path: &str, state: AuthState) -> GuardOutcome {
    if !MATCHED_PATHS.contains(&path) {
        return GuardOutcome::Bypass;
    }
    if PUBLIC_PATHS.contains(&path) || state == AuthState::Authenticated {
        return GuardOutcome::Pass;
    }
    GuardOutcome::RedirectToSignIn
}

/// `from_fn_with_state` middleware applied to the whole router.
pub async fn route_guard(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    raw: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let now = OffsetDateTime::now_utc();
    let token = cookies::read_session(&jar, now);

    match decide(request.uri().path(), AuthState::of(token.as_ref())) {
        GuardOutcome::Bypass => next.run(request).await,
        GuardOutcome::RedirectToSignIn => {
            tracing::debug!(path = %request.uri().path(), "no session; redirecting to sign-in");
            // Drops a stale or tampered cookie if one was sent.
            (cookies::clear_session(raw), Redirect::temporary(SIGN_IN_PATH)).into_response()
        }
        GuardOutcome::Pass => {
            let rolls = *request.method() == Method::GET || *request.method() == Method::HEAD;
            let response = next.run(request).await;
            match token.filter(SessionToken::is_authenticated) {
                Some(token) if rolls => roll_expiry(&state, jar, token, now, response).await,
                _ => response,
            }
        }
    }
}

async fn roll_expiry(
    state: &AppState,
    jar: PrivateCookieJar,
    token: SessionToken,
    now: OffsetDateTime,
    response: Response,
) -> Response {
    let config = &state.config;
    let refresh = SessionRefresh { token, identity: None, account: None, now };
    let token = match session::refresh_token(state.backend.as_ref(), refresh, config.session_max_age).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "session refresh failed; keeping existing cookie");
            return response;
        }
    };
    match cookies::write_session(jar, &token, config.session_max_age, config.cookie_secure) {
        Ok(jar) => (jar, response).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "session cookie re-issue failed");
            response
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
