use axum::{middleware::from_fn_with_state, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::require_auth;
use crate::auth::{AccessGuard, AuthService};

pub mod auth;
pub mod user;

/// Shared application state available in all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub guard: AccessGuard,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// Build the API routes. Protected routes sit behind the access guard.
pub fn build_routes(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(user::routes())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(auth::public_routes())
        .merge(protected)
        .with_state(state)
}
