use crate::{
    preferences::{currency_options, timezone_options, CurrencyOption, TimezoneOption},
    registration::{schema, FieldErrors, GateError, RegistrationForm, RegistrationGate, Step},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use utoipa::ToSchema;

/// Reported on `username` for every gate rejection so a closed admission
/// and a store failure look the same to the client.
pub const ACCOUNT_CREATION_FAILED: &str = "Username already exists or failed to create account.";

#[derive(ToSchema, Serialize, Debug)]
pub struct WizardStep {
    step: Step,
    number: u8,
    title: String,
    description: String,
    fields: Vec<String>,
}

impl From<Step> for WizardStep {
    fn from(step: Step) -> Self {
        Self {
            step,
            number: step.number(),
            title: step.title().to_string(),
            description: step.description().to_string(),
            fields: step
                .fields()
                .iter()
                .map(|field| field.name().to_string())
                .collect(),
        }
    }
}

/// Everything the registration wizard needs before rendering.
#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterOptions {
    can_register: bool,
    currencies: Vec<CurrencyOption>,
    timezones: Vec<TimezoneOption>,
    steps: Vec<WizardStep>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterResponse {
    success: bool,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    #[schema(value_type = Object)]
    errors: FieldErrors,
}

impl RegisterResponse {
    fn created() -> Self {
        Self {
            success: true,
            errors: FieldErrors::new(),
        }
    }

    fn failed(errors: FieldErrors) -> Self {
        Self {
            success: false,
            errors,
        }
    }

    fn account_creation_failed() -> Self {
        let mut errors = FieldErrors::new();
        errors.insert("username", ACCOUNT_CREATION_FAILED);
        Self::failed(errors)
    }
}

#[utoipa::path(
    get,
    path= "/v1/register",
    responses (
        (status = 200, description = "Admission status, select options and wizard steps", body = RegisterOptions),
        (status = 503, description = "User store unavailable"),
    ),
    tag= "register"
)]
pub async fn register_options(gate: Extension<Arc<RegistrationGate>>) -> impl IntoResponse {
    match gate.can_register().await {
        Ok(can_register) => (
            StatusCode::OK,
            Json(RegisterOptions {
                can_register,
                currencies: currency_options(),
                timezones: timezone_options(),
                steps: Step::ALL.into_iter().map(WizardStep::from).collect(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to read admission status: {}", err);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path= "/v1/register",
    request_body = RegistrationForm,
    responses (
        (status = 201, description = "Account created", body = RegisterResponse, content_type = "application/json"),
        (status = 400, description = "Validation failed, errors keyed by field", body = RegisterResponse),
        (status = 409, description = "An account already exists", body = RegisterResponse),
        (status = 503, description = "Account could not be created", body = RegisterResponse),
    ),
    tag= "register"
)]
#[instrument(skip(gate, payload))]
pub async fn register(
    gate: Extension<Arc<RegistrationGate>>,
    payload: Option<Json<RegistrationForm>>,
) -> impl IntoResponse {
    // A missing or unreadable body is an empty form: every field is required.
    let form = payload.map(|Json(form)| form).unwrap_or_default();

    debug!("form: {:?}", form);

    let registration = match schema::validate(&form) {
        Ok(registration) => registration,
        Err(errors) => {
            debug!("Registration form rejected: {} field(s)", errors.len());
            return (StatusCode::BAD_REQUEST, Json(RegisterResponse::failed(errors)));
        }
    };

    match gate.register(registration).await {
        Ok(_) => (StatusCode::CREATED, Json(RegisterResponse::created())),
        Err(GateError::AlreadyRegistered) => {
            warn!("Registration attempted after admission closed");
            (
                StatusCode::CONFLICT,
                Json(RegisterResponse::account_creation_failed()),
            )
        }
        Err(err) => {
            error!("Failed to create account: {:?}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(RegisterResponse::account_creation_failed()),
            )
        }
    }
}
