//! Credential exchange: turns a sign-in/sign-up form into one backend call.
//!
//! Validation happens before any network traffic. A submission that fails
//! validation never reaches the backend; one that passes makes exactly one
//! call, with no retry, and either yields an `IdentityRecord` or an
//! `ExchangeError`. The error keeps the precise cause for logs, while
//! `user_message` maps every rejection to one generic sentence: the UI never
//! distinguishes "unknown user" from "wrong password".

use serde::Deserialize;

use super::backend::{AuthBackend, BackendError, LoginRequest, RegisterRequest};
use super::identity::{IdentityError, IdentityRecord};

pub const MSG_INVALID_LOGIN: &str = "Invalid email or password";
pub const MSG_REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
pub const MSG_UNEXPECTED: &str = "An error occurred. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    #[default]
    Login,
    Register,
}

/// Form input. Transient: never stored and never logged.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub action: AuthAction,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("device_name", &self.device_name)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Password,
}

impl Field {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl Credentials {
    /// Required-field check, in form order. Empty means the form may be sent.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.action == AuthAction::Register && self.name.as_deref().is_none_or(is_blank) {
            errors.push(FieldError { field: Field::Name, message: "Name is required" });
        }
        if is_blank(&self.email) {
            errors.push(FieldError { field: Field::Email, message: "Email is required" });
        }
        if is_blank(&self.password) {
            errors.push(FieldError { field: Field::Password, message: "Password is required" });
        }
        errors
    }

    fn device_name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.device_name
            .as_deref()
            .filter(|v| !is_blank(v))
            .unwrap_or(default)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExchangeError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl ExchangeError {
    /// True when the backend answered but did not authenticate the user.
    /// False for transport failures.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Backend(BackendError::Network(_)))
    }

    /// The only text the UI ever shows for a failed exchange.
    #[must_use]
    pub fn user_message(&self, action: AuthAction) -> &'static str {
        match (self.is_rejection(), action) {
            (false, _) => MSG_UNEXPECTED,
            (true, AuthAction::Login) => MSG_INVALID_LOGIN,
            (true, AuthAction::Register) => MSG_REGISTRATION_FAILED,
        }
    }
}

/// Exchange validated credentials for an identity, with one backend call.
///
/// `default_device_name` is sent when the form leaves `device_name` empty.
///
/// # Errors
///
/// Returns the backend failure, or an identity error when a success body
/// lacks the user or tokens.
pub async fn exchange(
    backend: &dyn AuthBackend,
    credentials: &Credentials,
    default_device_name: &str,
) -> Result<IdentityRecord, ExchangeError> {
    let device_name = credentials.device_name_or(default_device_name).to_string();
    let resp = match credentials.action {
        AuthAction::Register => {
            let request = RegisterRequest {
                email: credentials.email.trim().to_string(),
                password: credentials.password.clone(),
                name: credentials.name.clone().unwrap_or_default(),
                device_name,
            };
            backend.register(&request).await?
        }
        AuthAction::Login => {
            let request = LoginRequest {
                email: credentials.email.trim().to_string(),
                password: credentials.password.clone(),
                device_name,
            };
            backend.login(&request).await?
        }
    };

    Ok(IdentityRecord::try_from(resp)?)
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
