//! Service configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Everything the service needs at runtime is read once at startup into an
//! immutable `AppConfig`. Google sign-in is optional: when any of its three
//! variables is missing the provider is simply disabled.

use std::time::Duration;

use crate::services::oauth::GoogleConfig;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DEVICE_NAME: &str = "Web Client";
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("{var} must be at least {min} bytes")]
    SecretTooShort { var: &'static str, min: usize },
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Timeouts applied to the backend HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    /// Whole-request timeout. `None` waits indefinitely.
    pub request: Option<Duration>,
    pub connect: Duration,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self { request: None, connect: Duration::from_secs(DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the auth backend, without a trailing slash.
    pub backend_url: String,
    pub session_secret: String,
    pub port: u16,
    pub cookie_secure: bool,
    /// Sent as `device_name` when the form does not supply one.
    pub device_name: String,
    pub session_max_age: time::Duration,
    pub revoke_on_sign_out: bool,
    pub backend_timeouts: BackendTimeouts,
    pub google: Option<GoogleConfig>,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `SESSION_SECRET` (at least 32 bytes)
    ///
    /// Optional:
    /// - `BACKEND_URL`: default `http://localhost:8000`
    /// - `PORT`: default 3000
    /// - `COOKIE_SECURE`: inferred from `GOOGLE_REDIRECT_URI` when absent
    /// - `DEVICE_NAME`: default `Web Client`
    /// - `SESSION_MAX_AGE_SECS`: default 30 days
    /// - `REVOKE_ON_SIGN_OUT`: default false
    /// - `BACKEND_TIMEOUT_SECS`: unset means no request timeout
    /// - `BACKEND_CONNECT_TIMEOUT_SECS`: default 10
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is missing or short, or a numeric
    /// variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret = std::env::var("SESSION_SECRET").map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::SecretTooShort { var: "SESSION_SECRET", min: MIN_SESSION_SECRET_LEN });
        }

        let backend_url = std::env::var("BACKEND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let google = GoogleConfig::from_env();
        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or_else(|| {
            google
                .as_ref()
                .is_some_and(|g| g.redirect_uri.starts_with("https://"))
        });

        let request = env_parse::<u64>("BACKEND_TIMEOUT_SECS")?.map(Duration::from_secs);
        let connect = env_parse::<u64>("BACKEND_CONNECT_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS);

        Ok(Self {
            backend_url,
            session_secret,
            port: env_parse("PORT")?.unwrap_or(DEFAULT_PORT),
            cookie_secure,
            device_name: std::env::var("DEVICE_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string()),
            session_max_age: time::Duration::seconds(
                env_parse("SESSION_MAX_AGE_SECS")?.unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS),
            ),
            revoke_on_sign_out: env_bool("REVOKE_ON_SIGN_OUT").unwrap_or(false),
            backend_timeouts: BackendTimeouts { request, connect: Duration::from_secs(connect) },
            google,
        })
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|raw| parse_bool(&raw))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_parse<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var: key, value: raw }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
