//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It is
//! immutable after startup: the parsed config, the backend client, the HTTP
//! client used for Google's token endpoint and the cookie key. There is no per-request shared state; the session itself lives
//! in the client's encrypted cookie.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::config::AppConfig;
use crate::services::backend::AuthBackend;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<dyn AuthBackend>,
    /// Carries the configured timeouts; cheap to clone.
    pub http: reqwest::Client,
    cookie_key: Key,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, backend: Arc<dyn AuthBackend>, http: reqwest::Client) -> Self {
        let cookie_key = derive_cookie_key(&config.session_secret);
        Self { config: Arc::new(config), backend, http, cookie_key }
    }
}

// `PrivateCookieJar` pulls its key out of the router state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Stretch the configured secret into the 64 bytes of key material the
/// cookie jar needs for encryption and signing.
#[must_use]
pub fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::config::BackendTimeouts;
    use crate::services::oauth::GoogleConfig;

    pub const TEST_SECRET: &str = "test-secret-test-secret-test-secret-0123";

    #[must_use]
    pub fn test_config() -> AppConfig {
        AppConfig {
            backend_url: "http://backend.invalid".into(),
            session_secret: TEST_SECRET.into(),
            port: 0,
            cookie_secure: false,
            device_name: "Web Client".into(),
            session_max_age: time::Duration::days(30),
            revoke_on_sign_out: false,
            backend_timeouts: BackendTimeouts::default(),
            google: None,
        }
    }

    #[must_use]
    pub fn test_google_config(token_url: &str) -> GoogleConfig {
        GoogleConfig {
            client_id: "cid".into(),
            client_secret: "csecret".into(),
            redirect_uri: "http://localhost:3000/auth/google/callback".into(),
            auth_url: crate::services::oauth::GOOGLE_AUTH_URL.into(),
            token_url: token_url.into(),
        }
    }

    /// Create a test `AppState` around the given backend double.
    #[must_use]
    pub fn test_app_state(backend: Arc<dyn AuthBackend>) -> AppState {
        test_app_state_with(test_config(), backend)
    }

    #[must_use]
    pub fn test_app_state_with(config: AppConfig, backend: Arc<dyn AuthBackend>) -> AppState {
        let http = crate::services::backend::http_client(config.backend_timeouts).unwrap();
        AppState::new(config, backend, http)
    }
}
