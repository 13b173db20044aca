use utoipa::OpenApi;

use crate::auth::AuthOutcome;
use crate::controllers::auth::{LoginRequest, LogoutAllResponse, RegisterRequest};
use crate::controllers::user::{
    ChangeEmailRequest, ChangePasswordRequest, DeleteAccountRequest, UpdateProfileRequest,
};
use crate::controllers::MessageResponse;
use crate::models::user::PublicUser;

/// OpenAPI documentation for the authentication API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "EduQuest Auth API",
        version = "0.1.0",
        description = "Accounts, sessions and bearer-token authentication for EduQuest."
    ),
    paths(
        crate::controllers::auth::register,
        crate::controllers::auth::login,
        crate::controllers::auth::google_login,
        crate::controllers::auth::google_callback,
        crate::controllers::auth::logout,
        crate::controllers::auth::logout_all,
        crate::controllers::auth::me,
        crate::controllers::user::update_profile,
        crate::controllers::user::change_email,
        crate::controllers::user::change_password,
        crate::controllers::user::delete_account,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LogoutAllResponse,
            AuthOutcome,
            PublicUser,
            UpdateProfileRequest,
            ChangeEmailRequest,
            ChangePasswordRequest,
            DeleteAccountRequest,
            MessageResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and sessions"),
        (name = "user", description = "Profile and account management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add JWT Bearer security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
