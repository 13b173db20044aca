use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AuthOutcome;
use crate::error::AuthError;
use crate::extractors::{AuthUser, Json};
use crate::models::user::PublicUser;
use crate::response::ApiResponse;

use super::{AppState, MessageResponse};

// ── Request / Response types ──

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    /// Authorization code issued by the provider
    pub code: Option<String>,
    /// Set by the provider when the user cancels or consent fails
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutAllResponse {
    /// Number of sessions revoked
    pub revoked: u64,
}

// ── Routes ──

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", get(google_login))
        .route("/api/auth/google/callback", get(google_callback))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/auth/me", get(me))
}

// ── Handlers ──

/// Register a new password account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<AuthOutcome>),
        (status = 400, description = "Missing or invalid input"),
        (status = 409, description = "User already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<AuthOutcome>), AuthError> {
    let outcome = state
        .auth
        .register(&payload.email, &payload.password, payload.name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::success(outcome)))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthOutcome>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account inactive")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<AuthOutcome>, AuthError> {
    let outcome = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ApiResponse::success(outcome))
}

/// Start Google login.
#[utoipa::path(
    get,
    path = "/api/auth/google",
    responses(
        (status = 303, description = "Redirect to Google consent screen"),
        (status = 404, description = "Google login is not configured")
    ),
    tag = "auth"
)]
pub async fn google_login(State(state): State<AppState>) -> Result<Redirect, AuthError> {
    let url = state.auth.provider_login_url()?;
    Ok(Redirect::to(&url))
}

/// Google redirects back here after consent.
///
/// Always answers with a redirect to the front end: the token on success,
/// the login page with an `error` code otherwise.
#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Redirect to the front end")
    ),
    tag = "auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if let Some(error) = query.error {
        tracing::info!(error = %error, "identity provider returned an error");
        return Redirect::to(&state.auth.frontend_login_url("access_denied"));
    }

    let code = query.code.unwrap_or_default();
    let target = match state.auth.provider_login(&code).await {
        Ok(outcome) => state
            .auth
            .provider_success_redirect(&outcome)
            .unwrap_or_else(|e| state.auth.provider_failure_redirect(&e)),
        Err(e) => {
            tracing::warn!(error = %e, "provider login failed");
            state.auth.provider_failure_redirect(&e)
        }
    };

    Redirect::to(&target)
}

/// Revoke the current session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<ApiResponse<MessageResponse>, AuthError> {
    state.auth.logout(&ctx).await?;
    Ok(ApiResponse::success(MessageResponse::new("Logged out successfully")))
}

/// Revoke every session of the current user.
#[utoipa::path(
    post,
    path = "/api/auth/logout-all",
    responses(
        (status = 200, description = "All sessions revoked", body = ApiResponse<LogoutAllResponse>),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_all(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<ApiResponse<LogoutAllResponse>, AuthError> {
    let revoked = state.auth.logout_all(&ctx).await?;
    Ok(ApiResponse::success(LogoutAllResponse { revoked }))
}

/// The authenticated user.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<PublicUser>),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<ApiResponse<PublicUser>, AuthError> {
    let user = state.auth.current_user(&ctx).await?;
    Ok(ApiResponse::success(user))
}
