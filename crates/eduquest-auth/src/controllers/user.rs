use axum::{
    extract::State,
    routing::{delete, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::ProfileUpdate;
use crate::error::AuthError;
use crate::extractors::{AuthUser, Json};
use crate::models::user::PublicUser;
use crate::response::ApiResponse;

use super::{AppState, MessageResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    /// Empty string removes the avatar
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeEmailRequest {
    #[serde(default)]
    pub new_email: String,
    /// Required when the account has a password
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// Required when the account already has a password
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteAccountRequest {
    /// Must match the configured confirmation phrase exactly
    #[serde(default)]
    pub confirmation: String,
    /// Required when the account has a password
    pub password: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/profile", put(update_profile))
        .route("/api/user/profile/email", put(change_email))
        .route("/api/user/profile/password", put(change_password))
        .route("/api/user/account", delete(delete_account))
}

/// Update display name and avatar.
#[utoipa::path(
    put,
    path = "/api/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<PublicUser>),
        (status = 400, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<PublicUser>, AuthError> {
    let user = state
        .auth
        .update_profile(
            &ctx,
            ProfileUpdate {
                name: payload.name,
                avatar_url: payload.avatar_url,
            },
        )
        .await?;
    Ok(ApiResponse::success(user))
}

/// Change the account email. The account becomes unverified.
#[utoipa::path(
    put,
    path = "/api/user/profile/email",
    request_body = ChangeEmailRequest,
    responses(
        (status = 200, description = "Email changed", body = ApiResponse<PublicUser>),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Wrong password"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn change_email(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<ChangeEmailRequest>,
) -> Result<ApiResponse<PublicUser>, AuthError> {
    let user = state
        .auth
        .change_email(&ctx, &payload.new_email, payload.password.as_deref())
        .await?;
    Ok(ApiResponse::success(user))
}

/// Change or set the account password.
#[utoipa::path(
    put,
    path = "/api/user/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Password too short"),
        (status = 401, description = "Wrong current password")
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<MessageResponse>, AuthError> {
    state
        .auth
        .change_password(
            &ctx,
            payload.current_password.as_deref(),
            &payload.new_password,
        )
        .await?;
    Ok(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    )))
}

/// Permanently delete the account and all of its sessions.
#[utoipa::path(
    delete,
    path = "/api/user/account",
    request_body = DeleteAccountRequest,
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Confirmation phrase missing or wrong"),
        (status = 401, description = "Wrong password")
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<ApiResponse<MessageResponse>, AuthError> {
    state
        .auth
        .delete_account(&ctx, &payload.confirmation, payload.password.as_deref())
        .await?;
    Ok(ApiResponse::success(MessageResponse::new(
        "Account deleted successfully",
    )))
}
