//! Registration: validation schema, wizard steps and the admission gate.

pub mod gate;
pub mod schema;
pub mod wizard;

pub use gate::{AdmissionStatus, GateError, RegistrationGate};
pub use schema::{validate, FieldErrors, Registration, RegistrationForm};
pub use wizard::{Step, Wizard, WizardError};
