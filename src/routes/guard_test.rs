use super::*;
use crate::routes::test_helpers::{get, location, post_form, session_cookie, session_set_by, set_cookies, signed_in_token};
use crate::services::test_helpers::MockBackend;
use crate::state::test_helpers::test_app_state;
use axum::Router;
use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get as get_route;
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use tower::ServiceExt;

// =============================================================================
// decide
// =============================================================================

#[test]
fn unmatched_paths_bypass() {
    for path in ["/", "/some/other/path", "/api/auth/session", "/dashboard/extra", "/healthz"] {
        assert_eq!(decide(path, AuthState::Unauthenticated), GuardOutcome::Bypass, "{path}");
        assert_eq!(decide(path, AuthState::Authenticated), GuardOutcome::Bypass, "{path}");
    }
}

#[test]
fn public_paths_always_pass() {
    for path in [SIGN_IN_PATH, SIGN_UP_PATH] {
        assert_eq!(decide(path, AuthState::Unauthenticated), GuardOutcome::Pass);
        assert_eq!(decide(path, AuthState::Authenticated), GuardOutcome::Pass);
    }
}

#[test]
fn dashboard_needs_session() {
    assert_eq!(decide(DASHBOARD_PATH, AuthState::Unauthenticated), GuardOutcome::RedirectToSignIn);
    assert_eq!(decide(DASHBOARD_PATH, AuthState::Authenticated), GuardOutcome::Pass);
}

#[test]
fn auth_state_requires_user() {
    assert_eq!(AuthState::of(None), AuthState::Unauthenticated);
    assert_eq!(AuthState::of(Some(&SessionToken::default())), AuthState::Unauthenticated);
    assert_eq!(AuthState::of(Some(&signed_in_token())), AuthState::Authenticated);
}

// =============================================================================
// middleware
// =============================================================================

fn guarded(state: AppState) -> Router {
    Router::new()
        .route(DASHBOARD_PATH, get_route(|| async { "dash" }).post(|| async { "posted" }))
        .route(SIGN_IN_PATH, get_route(|| async { "sign in" }))
        .route("/some/other/path", get_route(|| async { "other" }))
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .with_state(state)
}

fn state() -> AppState {
    test_app_state(Arc::new(MockBackend::failing(crate::services::backend::BackendError::Network("unused".into()))))
}

#[tokio::test]
async fn dashboard_without_cookie_redirects() {
    let response = guarded(state()).oneshot(get(DASHBOARD_PATH, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some(SIGN_IN_PATH));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn dashboard_with_tampered_cookie_redirects_and_clears() {
    let response = guarded(state())
        .oneshot(get(DASHBOARD_PATH, Some("session_token=garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn dashboard_with_expired_cookie_redirects() {
    let state = state();
    let mut token = signed_in_token();
    token.expires_at = OffsetDateTime::now_utc().unix_timestamp() - 10;
    let cookie = session_cookie(&Key::from_ref(&state), &token);

    let response = guarded(state).oneshot(get(DASHBOARD_PATH, Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn sign_in_is_never_redirected() {
    let response = guarded(state()).oneshot(get(SIGN_IN_PATH, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn other_paths_pass_through_untouched() {
    let response = guarded(state())
        .oneshot(get("/some/other/path", Some("session_token=garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn authenticated_dashboard_rolls_expiry() {
    let state = state();
    let key = Key::from_ref(&state);
    let mut token = signed_in_token();
    token.expires_at = OffsetDateTime::now_utc().unix_timestamp() + 60;
    let cookie = session_cookie(&key, &token);

    let response = guarded(state).oneshot(get(DASHBOARD_PATH, Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reissued = session_set_by(&key, &response).unwrap();
    assert_eq!(reissued.view(), token.view());
    assert!(reissued.expires_at > token.expires_at + 60);
}

#[tokio::test]
async fn authenticated_post_does_not_reissue() {
    let state = state();
    let cookie = session_cookie(&Key::from_ref(&state), &signed_in_token());

    let response = guarded(state).oneshot(post_form(DASHBOARD_PATH, "", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}
