//! Registration validation rules.
//!
//! The rules are declared once in [`RULES`] and evaluated per field. The
//! wizard gates each step on the subset of fields it owns and the HTTP handler
//! runs the full set before anything reaches the registration gate.

use crate::preferences::{Currency, Preferences, Timezone};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use utoipa::ToSchema;

/// Raw wizard input as submitted by the client. Missing fields are empty.
#[derive(ToSchema, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub currency: String,
    pub timezone: String,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("password", &"***")
            .field("confirm_password", &"***")
            .field("currency", &self.currency)
            .field("timezone", &self.timezone)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Username,
    Password,
    ConfirmPassword,
    Currency,
    Timezone,
}

impl Field {
    pub const ALL: [Self; 5] = [
        Self::Username,
        Self::Password,
        Self::ConfirmPassword,
        Self::Currency,
        Self::Timezone,
    ];

    /// Wire name, used as the key in error maps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::Currency => "currency",
            Self::Timezone => "timezone",
        }
    }

    fn value(self, form: &RegistrationForm) -> &str {
        match self {
            Self::Username => &form.username,
            Self::Password => &form.password,
            Self::ConfirmPassword => &form.confirm_password,
            Self::Currency => &form.currency,
            Self::Timezone => &form.timezone,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Rule {
    Required(&'static str),
    Matches(Field, &'static str),
    Currency(&'static str),
    Timezone(&'static str),
}

impl Rule {
    fn check(self, field: Field, form: &RegistrationForm) -> Result<(), &'static str> {
        let value = field.value(form);
        let ok = match self {
            // Usernames are stored trimmed; every other field is taken as typed.
            Self::Required(_) if field == Field::Username => !value.trim().is_empty(),
            Self::Required(_) => !value.is_empty(),
            Self::Matches(other, _) => value == other.value(form),
            Self::Currency(_) => value.parse::<Currency>().is_ok(),
            Self::Timezone(_) => value.parse::<Timezone>().is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(self.message())
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Required(message)
            | Self::Matches(_, message)
            | Self::Currency(message)
            | Self::Timezone(message) => message,
        }
    }
}

/// Rules in evaluation order; the first failing rule per field is reported.
const RULES: &[(Field, Rule)] = &[
    (Field::Username, Rule::Required("Username is required")),
    (Field::Password, Rule::Required("Password is required")),
    (
        Field::ConfirmPassword,
        Rule::Required("Confirm Password is required"),
    ),
    (
        Field::ConfirmPassword,
        Rule::Matches(Field::Password, "Passwords do not match"),
    ),
    (Field::Currency, Rule::Required("Currency is required")),
    (
        Field::Currency,
        Rule::Currency("Invalid currency, expected one of GBP, USD, EUR"),
    ),
    (Field::Timezone, Rule::Required("Timezone is required")),
    (
        Field::Timezone,
        Rule::Timezone("Invalid timezone, expected one of GMT, EST, PST, CET"),
    ),
];

/// Per-field validation messages keyed by wire field name.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(field.name())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A registration that passed every rule.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub preferences: Preferences,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("password", &"***")
            .field("preferences", &self.preferences)
            .finish()
    }
}

/// Evaluate the rules for `fields` only.
#[must_use]
pub fn validate_fields(form: &RegistrationForm, fields: &[Field]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (field, rule) in RULES {
        if !fields.contains(field) || errors.contains(*field) {
            continue;
        }
        if let Err(message) = rule.check(*field, form) {
            errors.insert(field.name(), message);
        }
    }
    errors
}

/// Run the full rule set and produce a typed registration.
///
/// # Errors
/// Returns the per-field messages when any rule fails.
pub fn validate(form: &RegistrationForm) -> Result<Registration, FieldErrors> {
    let errors = validate_fields(form, &Field::ALL);
    if !errors.is_empty() {
        return Err(errors);
    }

    let (Ok(currency), Ok(timezone)) = (
        form.currency.parse::<Currency>(),
        form.timezone.parse::<Timezone>(),
    ) else {
        // Both codes were checked by the rules above.
        return Err(errors);
    };

    Ok(Registration {
        username: form.username.trim().to_string(),
        password: form.password.clone(),
        preferences: Preferences { currency, timezone },
    })
}
