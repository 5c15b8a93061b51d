//! PostgreSQL-backed user store.

use super::{NewUser, StoreError, User, UserStore};
use crate::preferences::{Currency, Preferences, Timezone};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const SELECT_USER: &str = "SELECT u.id, u.username, u.password_hash, p.currency, p.timezone, \
     EXTRACT(EPOCH FROM u.created_at)::BIGINT AS created_at_unix \
     FROM users u JOIN user_preferences p ON p.user_id = u.id";

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and the single-admin index if they are missing.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn apply_schema(&self) -> Result<()> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "CREATE",
            db.statement = "schema.sql"
        );
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to apply database schema")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn count(&self) -> Result<i64, StoreError> {
        let query = "SELECT COUNT(*) AS count FROM users";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;
        row.try_get("count").map_err(StoreError::Unavailable)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(StoreError::Unavailable)?;

        let query = "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) \
                     RETURNING EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await
            .map_err(classify)?;
        let created_at_unix: i64 = row
            .try_get("created_at_unix")
            .map_err(StoreError::Unavailable)?;

        let query =
            "INSERT INTO user_preferences (user_id, currency, timezone) VALUES ($1, $2, $3)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(user.preferences.currency.code())
            .bind(user.preferences.timezone.code())
            .execute(&mut *tx)
            .instrument(span)
            .await
            .map_err(classify)?;

        // Dropping the transaction on any error above rolls back the user row.
        tx.commit().await.map_err(classify)?;

        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            preferences: user.preferences,
            created_at_unix,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("{SELECT_USER} WHERE u.id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = format!("{SELECT_USER} WHERE u.username = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::Unavailable)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .map_err(StoreError::Unavailable)?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .map_err(StoreError::Unavailable)
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let currency: String = row.try_get("currency").map_err(StoreError::Unavailable)?;
    let timezone: String = row.try_get("timezone").map_err(StoreError::Unavailable)?;
    let currency = currency
        .parse::<Currency>()
        .map_err(|err| StoreError::Unavailable(sqlx::Error::Decode(Box::new(err))))?;
    let timezone = timezone
        .parse::<Timezone>()
        .map_err(|err| StoreError::Unavailable(sqlx::Error::Decode(Box::new(err))))?;

    Ok(User {
        id: row.try_get("id").map_err(StoreError::Unavailable)?,
        username: row.try_get("username").map_err(StoreError::Unavailable)?,
        password_hash: row
            .try_get("password_hash")
            .map_err(StoreError::Unavailable)?,
        preferences: Preferences { currency, timezone },
        created_at_unix: row
            .try_get("created_at_unix")
            .map_err(StoreError::Unavailable)?,
    })
}

/// Unique violations mean another admission won; everything else is an outage.
fn classify(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict
    } else {
        StoreError::Unavailable(err)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
