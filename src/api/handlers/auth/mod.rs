//! Password login and cookie session endpoints.

pub mod login;
pub mod session;
pub mod types;
