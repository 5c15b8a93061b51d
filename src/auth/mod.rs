//! Credentials and sessions.
//!
//! - [`password`]: Argon2id hashing for the stored credential.
//! - [`session`]: stateless signed cookies, see [`SessionIssuer`].
//! - [`config`]: execution mode, cookie name and signing secrets.

pub mod config;
pub mod password;
pub mod session;

pub use config::{AuthConfig, Environment, DEFAULT_COOKIE_NAME};
pub use session::{SessionCookie, SessionIssuer, SESSION_TTL_SECONDS};
