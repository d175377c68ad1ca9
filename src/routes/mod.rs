//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the auth pages, the Google OAuth round trip and the
//! session JSON endpoint. The route guard wraps everything but only acts on
//! `/sign-in`, `/sign-up` and `/dashboard`.

pub mod auth;
pub mod cookies;
pub mod guard;
pub mod pages;
pub mod views;

#[cfg(test)]
pub mod test_helpers;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(redirect_root_to_dashboard))
        .route(guard::SIGN_IN_PATH, get(pages::sign_in_page).post(pages::sign_in_submit))
        .route(guard::SIGN_UP_PATH, get(pages::sign_up_page).post(pages::sign_up_submit))
        .route(guard::DASHBOARD_PATH, get(pages::dashboard))
        .route("/sign-out", post(pages::sign_out))
        .route("/auth/google", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/api/auth/session", get(auth::session_view))
        .route("/api/auth/sign-out", post(pages::sign_out))
        .route("/assets/auth.css", get(stylesheet))
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn_with_state(state.clone(), guard::route_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn redirect_root_to_dashboard() -> Redirect {
    Redirect::temporary(guard::DASHBOARD_PATH)
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], views::AUTH_CSS)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
