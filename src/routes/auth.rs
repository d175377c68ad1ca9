//! Google sign-in routes and the session JSON endpoint.
//!
//! DESIGN
//! ======
//! The callback never trusts the provider profile. The provider access token
//! only feeds the session projector's Google merge point, which trades it
//! with the backend. Any failure along the way lands on
//! `/sign-in?error=OAuthSignin` with the session cookie cleared, so a broken
//! Google round trip can never leave a half-built session behind.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::services::oauth;
use crate::services::session::{self, Account, SessionRefresh, SessionToken};
use crate::state::AppState;

use super::cookies::{self, CurrentSession};
use super::guard::{DASHBOARD_PATH, SIGN_IN_PATH};
use super::pages::OAUTH_SIGNIN_ERROR;

/// `GET /auth/google`: redirect to the Google consent screen.
pub async fn google_redirect(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    let Some(config) = &state.config.google else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Google sign-in not configured").into_response();
    };

    let oauth_state = oauth::generate_state();
    let url = match config.authorize_url(&oauth_state) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "google authorize url invalid");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Google sign-in misconfigured").into_response();
        }
    };

    let jar = cookies::set_oauth_state(jar, oauth_state, state.config.cookie_secure);
    (jar, Redirect::temporary(&url)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn abort(raw: CookieJar) -> Response {
    let jar = cookies::clear_oauth_state(cookies::clear_session(raw));
    let target = format!("{SIGN_IN_PATH}?error={OAUTH_SIGNIN_ERROR}");
    (jar, Redirect::temporary(&target)).into_response()
}

/// `GET /auth/google/callback`: exchange the code, bridge, set the session.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    raw: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(google) = &state.config.google else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Google sign-in not configured").into_response();
    };

    if let Some(error) = params.error.as_deref() {
        tracing::warn!(%error, "google returned an error");
        return abort(raw);
    }

    // Verify OAuth CSRF state from cookie.
    let expected_state = cookies::oauth_state(&jar);
    if expected_state.is_none() || expected_state.as_deref() != params.state.as_deref() {
        tracing::warn!("oauth state mismatch");
        return abort(raw);
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::warn!("oauth callback without code");
        return abort(raw);
    };

    let provider_token = match oauth::exchange_code(&state.http, google, code).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "oauth code exchange failed");
            return abort(raw);
        }
    };

    let account = Account::google(provider_token);
    let refresh = SessionRefresh {
        token: SessionToken::default(),
        identity: None,
        account: Some(&account),
        now: OffsetDateTime::now_utc(),
    };
    let token = match session::refresh_token(state.backend.as_ref(), refresh, state.config.session_max_age).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "google sign-in aborted");
            return abort(raw);
        }
    };

    let config = &state.config;
    let jar = match cookies::write_session(jar, &token, config.session_max_age, config.cookie_secure) {
        Ok(jar) => jar,
        Err(e) => {
            tracing::error!(error = %e, "session cookie write failed");
            return abort(raw);
        }
    };

    if let Some(user) = &token.user {
        tracing::info!(user_id = %user.id, "signed in with google");
    }
    (jar, cookies::clear_oauth_state(raw), Redirect::to(DASHBOARD_PATH)).into_response()
}

/// `GET /api/auth/session`: the session view, or `{}` when signed out.
pub async fn session_view(session: CurrentSession) -> Response {
    match session.authenticated() {
        Some(token) => Json(token.view()).into_response(),
        None => Json(serde_json::json!({})).into_response(),
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
