//! Normalized user + token bundle produced by a successful auth exchange.

use super::backend::TokenResponse;

#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("backend response has no user")]
    MissingUser,
    #[error("backend response has no access/refresh tokens")]
    MissingTokens,
}

/// Output of the credential adapter or the OAuth bridge. Only the session
/// projector consumes it.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: Option<String>,
}

impl TryFrom<TokenResponse> for IdentityRecord {
    type Error = IdentityError;

    fn try_from(resp: TokenResponse) -> Result<Self, Self::Error> {
        let user = resp.user.ok_or(IdentityError::MissingUser)?;
        let (Some(access_token), Some(refresh_token)) = (resp.access, resp.refresh) else {
            return Err(IdentityError::MissingTokens);
        };
        Ok(Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar: user.avatar,
            access_token,
            refresh_token,
            session_id: resp.session_id,
        })
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("avatar", &self.avatar)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
