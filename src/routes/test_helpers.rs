//! Shared helpers for router tests.

use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use time::{Duration, OffsetDateTime};

use crate::services::session::{SessionToken, SessionUser};

use super::cookies::write_session;

#[must_use]
pub fn signed_in_token() -> SessionToken {
    let now = OffsetDateTime::now_utc();
    SessionToken {
        access_token: Some("tok1".into()),
        refresh_token: Some("ref1".into()),
        user: Some(SessionUser { id: "1".into(), email: "a@b.com".into(), name: "A".into(), avatar: None }),
        issued_at: now.unix_timestamp(),
        expires_at: (now + Duration::hours(1)).unix_timestamp(),
    }
}

/// `name=value` for a `Cookie` request header carrying `token`, encrypted with `key`.
#[must_use]
pub fn session_cookie(key: &Key, token: &SessionToken) -> String {
    let jar = write_session(PrivateCookieJar::new(key.clone()), token, Duration::days(30), false).unwrap();
    set_cookies(&(jar, ()).into_response()).remove(0).split(';').next().unwrap().to_string()
}

/// All `Set-Cookie` lines on a response.
#[must_use]
pub fn set_cookies<B>(response: &Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Decode whatever session the response sets, as the next request would see it.
#[must_use]
pub fn session_set_by<B>(key: &Key, response: &Response<B>) -> Option<SessionToken> {
    let line = set_cookies(response).into_iter().find(|l| l.starts_with("session_token="))?;
    let pair = line.split(';').next()?.to_string();
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(header::COOKIE, pair.parse().ok()?);
    let jar = PrivateCookieJar::from_headers(&headers, key.clone());
    super::cookies::read_session(&jar, OffsetDateTime::now_utc())
}

#[must_use]
pub fn location<B>(response: &Response<B>) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[must_use]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[must_use]
pub fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}
