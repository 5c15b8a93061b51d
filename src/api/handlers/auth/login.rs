use super::types::{LoginRequest, LoginResponse};
use crate::{
    api::handlers::set_cookie_headers,
    auth::{
        password::{verify_password_blocking, verify_unknown_user_blocking},
        SessionIssuer,
    },
    store::UserStore,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = LoginResponse),
        (status = 503, description = "User store unavailable")
    ),
    tag = "auth"
)]
#[instrument(skip(store, issuer, payload))]
pub async fn login(
    store: Extension<Arc<dyn UserStore>>,
    issuer: Extension<Arc<SessionIssuer>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let username = request.username.trim();

    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            HeaderMap::new(),
            Json(LoginResponse { success: false }),
        )
            .into_response()
    };

    if username.is_empty() || request.password.is_empty() {
        return unauthorized();
    }

    let user = match store.find_by_username(username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Same Argon2 work as a wrong password.
            verify_unknown_user_blocking(request.password).await;
            warn!("Login failed: unknown user");
            return unauthorized();
        }
        Err(err) => {
            error!("Failed to look up user: {}", err);
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    if !verify_password_blocking(request.password, user.password_hash.clone()).await {
        warn!("Login failed: wrong password");
        return unauthorized();
    }

    let cookie = match issuer.issue(user.id) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to issue session: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    info!(user_id = %user.id, "User logged in");

    (
        StatusCode::OK,
        set_cookie_headers(&cookie),
        Json(LoginResponse { success: true }),
    )
        .into_response()
}
