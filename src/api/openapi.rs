use super::handlers::{auth, health, register};
use crate::{
    preferences::{Currency, CurrencyOption, Preferences, Timezone, TimezoneOption},
    registration::{RegistrationForm, Step},
};
use utoipa::{openapi::License, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        register::register_options,
        register::register,
        auth::login::login,
        auth::session::session,
        auth::session::logout,
    ),
    components(schemas(
        health::Health,
        register::RegisterOptions,
        register::RegisterResponse,
        register::WizardStep,
        RegistrationForm,
        Step,
        CurrencyOption,
        TimezoneOption,
        Preferences,
        Currency,
        Timezone,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::SessionResponse,
    )),
    tags(
        (name = "health", description = "Service and database health"),
        (name = "register", description = "One-time account registration"),
        (name = "auth", description = "Password login and cookie sessions"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.license = cargo_license();
    doc
}

fn cargo_license() -> Option<License> {
    let identifier = env!("CARGO_PKG_LICENSE").trim();
    if identifier.is_empty() {
        return None;
    }
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}
