//! User persistence.
//!
//! The store holds at most one user together with its preferences. The
//! cardinality is enforced by the store itself: inserting while a user
//! already exists yields [`StoreError::Conflict`].

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::preferences::Preferences;
use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

/// The registered user.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub preferences: Preferences,
    pub created_at_unix: i64,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("preferences", &self.preferences)
            .field("created_at_unix", &self.created_at_unix)
            .finish()
    }
}

/// Row pair written by a successful registration.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub preferences: Preferences,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("preferences", &self.preferences)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The insert was rejected by a uniqueness constraint.
    #[error("user already exists")]
    Conflict,
    #[error("user store unavailable")]
    Unavailable(#[source] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Number of registered users (zero or one).
    async fn count(&self) -> Result<i64, StoreError>;

    /// Insert the user and its preferences in one all-or-nothing write.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
