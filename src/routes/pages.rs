//! Server-rendered pages: sign-in, sign-up, dashboard and sign-out.
//!
//! Form posts run the credential exchange and, on success, the session
//! projector. Failures re-render the same form. The user only ever sees the
//! fixed messages from `services::credentials`; the precise cause goes to
//! the log.

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::services::credentials::{self, AuthAction, Credentials, FieldError, MSG_UNEXPECTED};
use crate::services::session::{self, SessionRefresh, SessionToken};
use crate::state::AppState;

use super::cookies::{self, CurrentSession};
use super::guard::{DASHBOARD_PATH, SIGN_IN_PATH};
use super::views::{self, FormView};

pub const OAUTH_SIGNIN_ERROR: &str = "OAuthSignin";
pub const MSG_OAUTH_SIGNIN: &str = "Google sign-in failed. Please try again.";

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    error: Option<String>,
}

fn query_error_message(code: &str) -> Option<&'static str> {
    match code {
        "" => None,
        OAUTH_SIGNIN_ERROR => Some(MSG_OAUTH_SIGNIN),
        _ => Some(MSG_UNEXPECTED),
    }
}

// =============================================================================
// FORMS
// =============================================================================

/// `GET /sign-in`
pub async fn sign_in_page(State(state): State<AppState>, Query(query): Query<SignInQuery>) -> Html<String> {
    let form_error = query.error.as_deref().and_then(query_error_message);
    let form = FormView { form_error, ..FormView::default() };
    Html(views::render_sign_in(&form, state.config.google.is_some()))
}

/// `POST /sign-in`
pub async fn sign_in_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(mut credentials): Form<Credentials>,
) -> Response {
    credentials.action = AuthAction::Login;
    submit(&state, jar, credentials).await
}

/// `GET /sign-up`
pub async fn sign_up_page() -> Html<String> {
    Html(views::render_sign_up(&FormView::default()))
}

/// `POST /sign-up`
pub async fn sign_up_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(mut credentials): Form<Credentials>,
) -> Response {
    credentials.action = AuthAction::Register;
    submit(&state, jar, credentials).await
}

fn render_form(
    state: &AppState,
    credentials: &Credentials,
    field_errors: &[FieldError],
    form_error: Option<&str>,
    status: StatusCode,
) -> Response {
    let form = FormView {
        name: credentials.name.as_deref().unwrap_or_default(),
        email: &credentials.email,
        field_errors,
        form_error,
    };
    let html = match credentials.action {
        AuthAction::Login => views::render_sign_in(&form, state.config.google.is_some()),
        AuthAction::Register => views::render_sign_up(&form),
    };
    (status, Html(html)).into_response()
}

async fn submit(state: &AppState, jar: PrivateCookieJar, credentials: Credentials) -> Response {
    let errors = credentials.validate();
    if !errors.is_empty() {
        return render_form(state, &credentials, &errors, None, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let config = &state.config;
    let identity = match credentials::exchange(state.backend.as_ref(), &credentials, &config.device_name).await {
        Ok(identity) => identity,
        Err(e) => {
            let status = if e.is_rejection() { StatusCode::UNAUTHORIZED } else { StatusCode::BAD_GATEWAY };
            tracing::warn!(error = %e, action = ?credentials.action, "credential exchange failed");
            let message = e.user_message(credentials.action);
            return render_form(state, &credentials, &[], Some(message), status);
        }
    };

    let refresh = SessionRefresh {
        token: SessionToken::default(),
        identity: Some(&identity),
        account: None,
        now: OffsetDateTime::now_utc(),
    };
    let token = match session::refresh_token(state.backend.as_ref(), refresh, config.session_max_age).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session projection failed");
            return render_form(state, &credentials, &[], Some(MSG_UNEXPECTED), StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let jar = match cookies::write_session(jar, &token, config.session_max_age, config.cookie_secure) {
        Ok(jar) => jar,
        Err(e) => {
            tracing::error!(error = %e, "session cookie write failed");
            return render_form(state, &credentials, &[], Some(MSG_UNEXPECTED), StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    tracing::info!(user_id = %identity.id, action = ?credentials.action, "signed in");
    (jar, Redirect::to(DASHBOARD_PATH)).into_response()
}

// =============================================================================
// DASHBOARD / SIGN-OUT
// =============================================================================

/// `GET /dashboard`
pub async fn dashboard(session: CurrentSession) -> Response {
    match session.authenticated().and_then(|t| t.user) {
        Some(user) => Html(views::render_dashboard(&user)).into_response(),
        None => Redirect::temporary(SIGN_IN_PATH).into_response(),
    }
}

/// `POST /sign-out` and `POST /api/auth/sign-out`
pub async fn sign_out(State(state): State<AppState>, jar: PrivateCookieJar, raw: CookieJar) -> Response {
    let token = cookies::read_session(&jar, OffsetDateTime::now_utc());

    if state.config.revoke_on_sign_out {
        if let Some(SessionToken { access_token: Some(access), refresh_token: Some(refresh), .. }) = &token {
            if let Err(e) = state.backend.logout(access, refresh).await {
                tracing::warn!(error = %e, "backend logout failed; clearing cookie anyway");
            }
        }
    }

    if let Some(user) = token.and_then(|t| t.user) {
        tracing::info!(user_id = %user.id, "signed out");
    }
    (cookies::clear_session(raw), Redirect::to(SIGN_IN_PATH)).into_response()
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
