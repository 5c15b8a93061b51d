//! Argon2id password hashing.

use anyhow::{anyhow, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::sync::OnceLock;
use tracing::error;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash a password into a PHC string with a fresh random salt.
///
/// # Errors
/// Returns an error if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?
        .to_string();
    Ok(hash)
}

/// Check a password against a stored PHC string. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash_password`] on the blocking pool.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// [`verify_password`] on the blocking pool. A failed task never matches.
pub async fn verify_password_blocking(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await {
        Ok(matched) => matched,
        Err(err) => {
            error!("Password verification task failed: {}", err);
            false
        }
    }
}

/// Verify against a throwaway hash on the blocking pool. Never matches.
pub async fn verify_unknown_user_blocking(password: String) {
    if let Err(err) =
        tokio::task::spawn_blocking(move || verify_password(&password, dummy_hash())).await
    {
        error!("Password verification task failed: {}", err);
    }
}

/// Hash of a random secret with the same parameters as stored hashes.
///
/// Logins for unknown users verify against it so they cost the same as a
/// wrong password.
#[must_use]
fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| {
        let secret: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        hash_password(&secret).unwrap_or_else(|err| {
            error!("Failed to build dummy password hash: {}", err);
            String::new()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() -> Result<()> {
        let first = hash_password("correct horse")?;
        let second = hash_password("correct horse")?;
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &first));
        assert!(verify_password("correct horse", &second));
        assert!(!verify_password("battery staple", &first));
        Ok(())
    }

    #[tokio::test]
    async fn blocking_variants_hash_and_verify() -> Result<()> {
        let hash = hash_password_blocking("correct horse".to_string()).await?;
        assert!(verify_password_blocking("correct horse".to_string(), hash.clone()).await);
        assert!(!verify_password_blocking("battery staple".to_string(), hash).await);
        Ok(())
    }

    #[test]
    fn dummy_hash_costs_the_same_as_a_stored_hash() -> Result<()> {
        let stored = hash_password("correct horse")?;
        let stored = PasswordHash::new(&stored).map_err(|err| anyhow!("{err}"))?;
        let dummy = PasswordHash::new(dummy_hash()).map_err(|err| anyhow!("{err}"))?;
        assert_eq!(dummy.algorithm, stored.algorithm);
        assert_eq!(dummy.version, stored.version);
        assert_eq!(dummy.params, stored.params);
        assert!(!verify_password("", dummy_hash()));
        assert_eq!(dummy_hash(), dummy_hash());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_verification_runs_off_the_runtime() {
        verify_unknown_user_blocking("correct horse".to_string()).await;
        assert!(PasswordHash::new(dummy_hash()).is_ok());
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }
}
