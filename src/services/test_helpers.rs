//! In-process `AuthBackend` double shared by service and route tests.

use std::sync::Mutex;

use super::backend::{AuthBackend, BackendError, BackendUser, LoginRequest, RegisterRequest, TokenResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Login(LoginRequest),
    Register(RegisterRequest),
    Google(String),
    Logout { access: String, refresh: String },
}

/// Answers every token endpoint with the same canned reply and records calls.
pub struct MockBackend {
    reply: Result<TokenResponse, BackendError>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockBackend {
    #[must_use]
    pub fn replying(reply: Result<TokenResponse, BackendError>) -> Self {
        Self { reply, calls: Mutex::new(Vec::new()) }
    }

    #[must_use]
    pub fn ok(resp: TokenResponse) -> Self {
        Self::replying(Ok(resp))
    }

    #[must_use]
    pub fn failing(err: BackendError) -> Self {
        Self::replying(Err(err))
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) -> Result<TokenResponse, BackendError> {
        self.calls.lock().unwrap().push(call);
        self.reply.clone()
    }
}

#[async_trait::async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, BackendError> {
        self.record(MockCall::Login(request.clone()))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, BackendError> {
        self.record(MockCall::Register(request.clone()))
    }

    async fn exchange_google(&self, provider_access_token: &str) -> Result<TokenResponse, BackendError> {
        self.record(MockCall::Google(provider_access_token.to_string()))
    }

    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), BackendError> {
        self.record(MockCall::Logout { access: access_token.to_string(), refresh: refresh_token.to_string() })
            .map(|_| ())
    }
}

/// Backend success body for `{id, email, name}` with the given tokens.
#[must_use]
pub fn token_response(id: &str, email: &str, name: &str, access: &str, refresh: &str) -> TokenResponse {
    TokenResponse {
        access: Some(access.to_string()),
        refresh: Some(refresh.to_string()),
        user: Some(BackendUser { id: id.to_string(), email: email.to_string(), name: name.to_string(), avatar: None }),
        session_id: None,
    }
}
