//! # Timekeep (single-admin registration and sessions)
//!
//! `timekeep` is the account service behind a single-user time tracker. It
//! handles the one-time registration of the only account, password login and
//! stateless signed-cookie sessions.
//!
//! ## Admission Model
//!
//! Exactly one user may ever be registered. The admission state
//! (`Unregistered` -> `Registered`) is derived from the number of rows in the
//! user store, never from an in-memory flag, so it survives restarts and is
//! shared by every instance pointed at the same database.
//!
//! - **Write-time re-check:** the registration gate re-checks admission when
//!   the form is submitted, not only when it is rendered.
//! - **Store-enforced cardinality:** two racing submissions are settled by a
//!   unique index over a constant expression; the loser is reported as
//!   already registered.
//!
//! ## Sessions
//!
//! Session cookies carry the user id and an expiry, signed with HMAC-SHA256.
//! Nothing is stored server side. Several secrets may be configured: the
//! first signs, all of them verify, which allows rotation without logging
//! everyone out.
//!
//! ## Registration Wizard
//!
//! The three-step wizard (account, preferences, confirmation) and the
//! `POST /v1/register` handler validate with the same rule set in
//! [`registration::schema`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod preferences;
pub mod registration;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// Seconds since the unix epoch, clamped to zero for clocks set before 1970.
pub(crate) fn now_unix_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}
