//! Three-step registration wizard.
//!
//! Forward navigation is gated on the rules for the fields the current step
//! owns; submission re-runs the whole schema so the server and the wizard can
//! never disagree about what is valid.

use super::schema::{self, Field, FieldErrors, Registration, RegistrationForm};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Account,
    Preferences,
    Confirmation,
}

impl Step {
    pub const ALL: [Self; 3] = [Self::Account, Self::Preferences, Self::Confirmation];

    /// One-based position shown to the user.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Account => 1,
            Self::Preferences => 2,
            Self::Confirmation => 3,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Account => "Account Info",
            Self::Preferences => "Preferences",
            Self::Confirmation => "Confirmation",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Account => "Set up your account to start tracking your time",
            Self::Preferences => "Configure your currency and timezone settings",
            Self::Confirmation => "Create your account and start tracking",
        }
    }

    /// Fields collected (and validated) on this step.
    #[must_use]
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::Account => &[Field::Username, Field::Password, Field::ConfirmPassword],
            Self::Preferences => &[Field::Currency, Field::Timezone],
            Self::Confirmation => &[],
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Account => Some(Self::Preferences),
            Self::Preferences => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Account => None,
            Self::Preferences => Some(Self::Account),
            Self::Confirmation => Some(Self::Preferences),
        }
    }

    /// Step that owns `field`.
    #[must_use]
    pub fn owning(field: Field) -> Self {
        Self::ALL
            .into_iter()
            .find(|step| step.fields().contains(&field))
            .unwrap_or(Self::Account)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("submission is only possible from the confirmation step (currently on {0:?})")]
    NotOnConfirmation(Step),
    #[error("registration has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),
}

#[derive(Debug, Default)]
pub struct Wizard {
    step: Step,
    form: RegistrationForm,
    errors: FieldErrors,
}

impl Wizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.form
    }

    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Validate the current step and advance when it is clean.
    ///
    /// Returns `true` if the wizard moved forward. The confirmation step has
    /// no successor; use [`Wizard::submit`] there.
    pub fn next(&mut self) -> bool {
        let step = self.step();
        self.errors = schema::validate_fields(&self.form, step.fields());
        if !self.errors.is_empty() {
            return false;
        }
        match step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    /// Move one step back. Does nothing on the first step.
    pub fn back(&mut self) {
        if let Some(previous) = self.step().previous() {
            self.step = previous;
        }
    }

    /// Validate the whole form from the confirmation step.
    ///
    /// On failure the wizard jumps back to the earliest step holding an error.
    ///
    /// # Errors
    /// Returns [`WizardError::NotOnConfirmation`] before the last step and
    /// [`WizardError::Invalid`] when any field fails validation.
    pub fn submit(&mut self) -> Result<Registration, WizardError> {
        let step = self.step();
        if step != Step::Confirmation {
            return Err(WizardError::NotOnConfirmation(step));
        }
        match schema::validate(&self.form) {
            Ok(registration) => {
                self.errors = FieldErrors::new();
                Ok(registration)
            }
            Err(errors) => {
                self.apply_errors(errors.clone());
                Err(WizardError::Invalid(errors))
            }
        }
    }

    /// Show errors reported by the server and return to the step that owns them.
    pub fn apply_errors(&mut self, errors: FieldErrors) {
        if let Some(step) = Field::ALL
            .into_iter()
            .filter(|field| errors.contains(*field))
            .map(Step::owning)
            .min()
        {
            self.step = step;
        }
        self.errors = errors;
    }

    /// Start over after a successful registration.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
