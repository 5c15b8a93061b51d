//! Single-admission registration gate.

use super::schema::Registration;
use crate::auth::password::hash_password_blocking;
use crate::store::{NewUser, StoreError, User, UserStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// Admission state of the deployment. `Registered` is terminal.
#[derive(ToSchema, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionStatus {
    Unregistered,
    Registered,
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Admission is closed, or a concurrent registration won the race.
    #[error("an account has already been registered")]
    AlreadyRegistered,
    #[error("user store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),
    #[error("failed to hash password: {0}")]
    Hash(String),
}

impl From<StoreError> for GateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::AlreadyRegistered,
            StoreError::Unavailable(source) => Self::StoreUnavailable(source),
        }
    }
}

pub struct RegistrationGate {
    store: Arc<dyn UserStore>,
}

impl RegistrationGate {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Current admission state, read from the store.
    ///
    /// # Errors
    /// Returns [`GateError::StoreUnavailable`] if the store cannot be queried.
    pub async fn status(&self) -> Result<AdmissionStatus, GateError> {
        let count = self.store.count().await?;
        Ok(if count == 0 {
            AdmissionStatus::Unregistered
        } else {
            AdmissionStatus::Registered
        })
    }

    /// True iff no user exists yet.
    ///
    /// # Errors
    /// Returns [`GateError::StoreUnavailable`] if the store cannot be queried.
    pub async fn can_register(&self) -> Result<bool, GateError> {
        Ok(self.status().await? == AdmissionStatus::Unregistered)
    }

    /// Create the single account.
    ///
    /// Admission is re-checked here, at write time. A check that passes can
    /// still lose a race against another submission; the store's uniqueness
    /// constraint settles it and the loser gets [`GateError::AlreadyRegistered`].
    ///
    /// # Errors
    /// Returns [`GateError::AlreadyRegistered`] when admission is closed,
    /// [`GateError::Hash`] if hashing fails and [`GateError::StoreUnavailable`]
    /// on store failures. Nothing is written on error.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<User, GateError> {
        if self.status().await? == AdmissionStatus::Registered {
            warn!("Registration rejected: admission closed");
            return Err(GateError::AlreadyRegistered);
        }

        let Registration {
            username,
            password,
            preferences,
        } = registration;
        let password_hash = hash_password_blocking(password)
            .await
            .map_err(|err| GateError::Hash(err.to_string()))?;

        let user = self
            .store
            .insert(NewUser {
                username,
                password_hash,
                preferences,
            })
            .await
            .map_err(|err| {
                if matches!(err, StoreError::Conflict) {
                    warn!("Registration rejected: store refused a second user");
                }
                GateError::from(err)
            })?;

        info!(user_id = %user.id, "User registered");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::preferences::{Currency, Preferences, Timezone};
    use crate::store::MemoryUserStore;
    use async_trait::async_trait;
    use uuid::Uuid;

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: "hunter22".to_string(),
            preferences: Preferences {
                currency: Currency::Usd,
                timezone: Timezone::Pst,
            },
        }
    }

    #[tokio::test]
    async fn admission_closes_after_first_registration() -> anyhow::Result<()> {
        let store = Arc::new(MemoryUserStore::new());
        let gate = RegistrationGate::new(store.clone());

        assert!(gate.can_register().await?);
        assert_eq!(gate.status().await?, AdmissionStatus::Unregistered);

        let user = gate.register(registration("alice")).await?;
        assert_eq!(user.username, "alice");
        assert!(verify_password("hunter22", &user.password_hash));
        assert_ne!(user.password_hash, "hunter22");

        for attempt in ["bob", "alice"] {
            let result = gate.register(registration(attempt)).await;
            assert!(matches!(result, Err(GateError::AlreadyRegistered)));
            assert!(!gate.can_register().await?);
        }
        assert_eq!(gate.status().await?, AdmissionStatus::Registered);
        assert_eq!(store.count().await?, 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_registrations_admit_exactly_one() -> anyhow::Result<()> {
        let store = Arc::new(MemoryUserStore::new());
        let gate = Arc::new(RegistrationGate::new(store.clone()));

        let first = tokio::spawn({
            let gate = gate.clone();
            async move { gate.register(registration("tab-one")).await }
        });
        let second = tokio::spawn({
            let gate = gate.clone();
            async move { gate.register(registration("tab-two")).await }
        });
        let results = [first.await?, second.await?];

        let admitted = results.iter().filter(|result| result.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|result| matches!(result, Err(GateError::AlreadyRegistered)))
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(rejected, 1);
        assert_eq!(store.count().await?, 1);
        Ok(())
    }

    /// Reports an empty store to every admission check, as a racing
    /// submission would observe, but keeps the real single-row insert.
    struct StaleCountStore(MemoryUserStore);

    #[async_trait]
    impl UserStore for StaleCountStore {
        async fn count(&self) -> Result<i64, StoreError> {
            Ok(0)
        }

        async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
            self.0.insert(user).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_by_id(id).await
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_username(username).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn store_conflict_after_stale_check_is_already_registered() -> anyhow::Result<()> {
        let store = Arc::new(StaleCountStore(MemoryUserStore::new()));
        let gate = RegistrationGate::new(store.clone());

        gate.register(registration("tab-one")).await?;
        let result = gate.register(registration("tab-two")).await;
        assert!(matches!(result, Err(GateError::AlreadyRegistered)));
        assert_eq!(store.0.count().await?, 1);
        Ok(())
    }

    struct DownStore;

    #[async_trait]
    impl UserStore for DownStore {
        async fn count(&self) -> Result<i64, StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }

        async fn insert(&self, _user: NewUser) -> Result<User, StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn store_outage_is_reported_as_unavailable() {
        let gate = RegistrationGate::new(Arc::new(DownStore));
        assert!(matches!(
            gate.can_register().await,
            Err(GateError::StoreUnavailable(_))
        ));
        assert!(matches!(
            gate.register(registration("alice")).await,
            Err(GateError::StoreUnavailable(_))
        ));
    }
}
