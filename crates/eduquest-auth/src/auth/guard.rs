use std::sync::Arc;

use chrono::Utc;

use super::credentials::CredentialStore;
use super::jwt::{Claims, TokenError, TokenService};
use super::session::SessionStore;
use crate::error::AuthError;
use crate::models::session;

/// Identity resolved for an authenticated request.
///
/// Only the access guard creates one; handlers read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub session_id: i32,
    /// The bearer token the request was authenticated with
    pub token: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Per-request authentication: token, then session, then account.
///
/// Each step either hands the next one what it resolved or stops the
/// chain with an error; no request proceeds half-validated.
#[derive(Clone)]
pub struct AccessGuard {
    tokens: Arc<TokenService>,
    sessions: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialStore>,
}

impl AccessGuard {
    pub fn new(
        tokens: Arc<TokenService>,
        sessions: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        AccessGuard {
            tokens,
            sessions,
            credentials,
        }
    }

    /// Authenticate from the raw `Authorization` header value.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = bearer_token(authorization).ok_or(AuthError::AccessTokenRequired)?;
        let claims = self.verify_token(token)?;
        let session = self.live_session(token, &claims).await?;
        self.require_active(&claims).await?;

        Ok(AuthContext {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            session_id: session.id,
            token: token.to_string(),
        })
    }

    fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token).map_err(|e| {
            match e {
                TokenError::Expired => tracing::debug!("bearer token expired"),
                TokenError::MalformedOrForged => tracing::warn!("bearer token failed verification"),
            }
            AuthError::from(e)
        })
    }

    async fn live_session(&self, token: &str, claims: &Claims) -> Result<session::Model, AuthError> {
        let session = self
            .sessions
            .find_by_token(token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.user_id != claims.sub {
            tracing::warn!(session_id = session.id, "session belongs to a different user");
            return Err(AuthError::SessionNotFound);
        }

        if session.is_expired_at(Utc::now().naive_utc()) {
            // Deletes are idempotent, so this may race the sweeper.
            self.sessions.delete_by_token(token).await?;
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    async fn require_active(&self, claims: &Claims) -> Result<(), AuthError> {
        match self.credentials.find_by_id(&claims.sub).await? {
            Some(user) if user.is_active => Ok(()),
            _ => Err(AuthError::AccountInactive),
        }
    }
}
