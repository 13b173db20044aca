//! Access guard as axum middleware.
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/api/auth/me", get(me))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::controllers::AppState;
use crate::error::AuthError;

/// Run the access guard and attach the resolved [`AuthContext`] to the request.
///
/// [`AuthContext`]: crate::auth::guard::AuthContext
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let ctx = state.guard.authenticate(header).await?;
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
