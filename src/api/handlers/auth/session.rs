//! Session endpoints for cookie auth.

use super::types::SessionResponse;
use crate::{api::handlers::set_cookie_headers, auth::SessionIssuer, store::UserStore};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session"),
        (status = 503, description = "User store unavailable")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    store: Extension<Arc<dyn UserStore>>,
    issuer: Extension<Arc<SessionIssuer>>,
) -> impl IntoResponse {
    // Missing, tampered and expired cookies all read as "no session".
    let Some(user_id) = issuer.session_from_headers(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match store.find_by_id(user_id).await {
        Ok(Some(user)) => {
            let response = SessionResponse {
                user_id: user.id.to_string(),
                username: user.username,
                currency: user.preferences.currency.code().to_string(),
                timezone: user.preferences.timezone.code().to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        // Signed for a user that no longer exists.
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to resolve session user: {}", err);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(issuer: Extension<Arc<SessionIssuer>>) -> impl IntoResponse {
    // Always clear the cookie, whether or not a session was present.
    info!("Session cleared");
    (StatusCode::NO_CONTENT, set_cookie_headers(&issuer.revoke())).into_response()
}
