use crate::registration::{AdmissionStatus, RegistrationGate};
use axum::{
    extract::Extension,
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

pub const LOGIN_PATH: &str = "/dashboard/login";
pub const REGISTER_PATH: &str = "/dashboard/register";

// Send visitors to registration until the account exists, then to login.
pub async fn root(gate: Extension<Arc<RegistrationGate>>) -> impl IntoResponse {
    match gate.status().await {
        Ok(AdmissionStatus::Registered) => (StatusCode::FOUND, [(LOCATION, LOGIN_PATH)]).into_response(),
        Ok(AdmissionStatus::Unregistered) => {
            (StatusCode::FOUND, [(LOCATION, REGISTER_PATH)]).into_response()
        }
        Err(err) => {
            error!("Failed to read admission status: {}", err);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
