//! HTTP handlers.
//!
//! Handlers receive their collaborators through `Extension` layers: the
//! shared [`crate::store::UserStore`], the [`crate::registration::RegistrationGate`]
//! built over it and the [`crate::auth::SessionIssuer`].

pub mod auth;
pub mod health;
pub mod register;
pub mod root;

use crate::auth::SessionCookie;
use axum::http::{header::SET_COOKIE, HeaderMap};
use tracing::error;

/// Headers carrying `cookie` as `Set-Cookie`, empty if it cannot be encoded.
pub(crate) fn set_cookie_headers(cookie: &SessionCookie) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match cookie.to_header_value() {
        Ok(value) => {
            headers.insert(SET_COOKIE, value);
        }
        Err(err) => error!("Failed to encode session cookie: {}", err),
    }
    headers
}
