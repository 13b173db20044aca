use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::guard::AuthContext;
use crate::error::AuthError;

/// The identity resolved by the access guard.
///
/// Only available on routes behind [`require_auth`]; elsewhere the
/// extraction fails with `AccessTokenRequired`.
///
/// ```rust,ignore
/// async fn me(AuthUser(ctx): AuthUser) -> impl IntoResponse {
///     // ctx.user_id is the authenticated user's ID
/// }
/// ```
///
/// [`require_auth`]: crate::auth::middleware::require_auth
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthUser)
            .ok_or(AuthError::AccessTokenRequired)
    }
}
