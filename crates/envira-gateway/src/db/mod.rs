//! Database and repository layer for users, sensor readings and chat history.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envira_core::{ChatRecord, SensorReading, User};
#[cfg(feature = "persistence-sqlx")]
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use thiserror::Error;

mod memory;

pub use memory::{InMemoryChatRepository, InMemorySensorRepository, InMemoryUserRepository};

/// Database connection pool type used by gateway persistence.
#[cfg(feature = "persistence-sqlx")]
pub type DatabasePool = PgPool;

/// Placeholder pool type when SQLx persistence is disabled.
#[cfg(not(feature = "persistence-sqlx"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabasePool;

/// SQL schema for the `users` table.
pub const USERS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);"#;

/// SQL schema for the `sensor_readings` table.
pub const SENSOR_READINGS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sensor_readings (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    temperature DOUBLE PRECISION NOT NULL,
    humidity DOUBLE PRECISION NOT NULL,
    location TEXT NOT NULL,
    device_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);"#;

/// Index backing the per-user time-range queries.
pub const SENSOR_READINGS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS sensor_readings_user_created_idx
    ON sensor_readings (user_id, created_at DESC);"#;

/// SQL schema for the `chats` table.
pub const CHATS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    message TEXT NOT NULL,
    response TEXT NOT NULL,
    model TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);"#;

/// Error type returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[cfg(feature = "persistence-sqlx")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// SQLx persistence feature is disabled.
    #[error("persistence-sqlx feature is disabled")]
    SqlxDisabled,
}

/// Create a PostgreSQL connection pool for gateway persistence.
#[cfg(feature = "persistence-sqlx")]
pub async fn init_pool(database_url: &str) -> Result<DatabasePool, RepositoryError> {
    Ok(PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?)
}

/// Create a PostgreSQL connection pool for gateway persistence.
#[cfg(not(feature = "persistence-sqlx"))]
pub async fn init_pool(_database_url: &str) -> Result<DatabasePool, RepositoryError> {
    Err(RepositoryError::SqlxDisabled)
}

/// Initialize required tables if they do not exist.
#[cfg(feature = "persistence-sqlx")]
pub async fn initialize_schema(pool: &DatabasePool) -> Result<(), RepositoryError> {
    sqlx::query(USERS_TABLE_SCHEMA).execute(pool).await?;
    sqlx::query(SENSOR_READINGS_TABLE_SCHEMA).execute(pool).await?;
    sqlx::query(SENSOR_READINGS_INDEX).execute(pool).await?;
    sqlx::query(CHATS_TABLE_SCHEMA).execute(pool).await?;
    Ok(())
}

/// Initialize required tables if they do not exist.
#[cfg(not(feature = "persistence-sqlx"))]
pub async fn initialize_schema(_pool: &DatabasePool) -> Result<(), RepositoryError> {
    Err(RepositoryError::SqlxDisabled)
}

/// Persistence operations for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create and persist a user.
    async fn create(&self, name: &str, email: &str) -> Result<User, RepositoryError>;
    /// Load one user by ID.
    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError>;
    /// Load one user by email (the device API key).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// Oldest registered user, if any.
    async fn first(&self) -> Result<Option<User>, RepositoryError>;
}

/// Persistence operations for sensor readings.
#[async_trait]
pub trait SensorRepository: Send + Sync {
    /// Persist a reading as given, including its timestamps.
    async fn insert(&self, reading: SensorReading) -> Result<SensorReading, RepositoryError>;
    /// Newest readings for a user, newest first.
    async fn latest(&self, user_id: &str, limit: usize)
        -> Result<Vec<SensorReading>, RepositoryError>;
    /// Readings for a user created at or after `since`, oldest first.
    async fn list_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, RepositoryError>;
    /// Number of readings stored for a user.
    async fn count_for_user(&self, user_id: &str) -> Result<usize, RepositoryError>;
    /// Number of readings stored overall.
    async fn count(&self) -> Result<usize, RepositoryError>;
}

/// Persistence operations for chat exchanges.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Persist one exchange.
    async fn insert(&self, record: ChatRecord) -> Result<ChatRecord, RepositoryError>;
    /// The `limit` most recent exchanges for a user, returned oldest first.
    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatRecord>, RepositoryError>;
    /// Remove a user's whole history. Returns the number of deleted records.
    async fn delete_for_user(&self, user_id: &str) -> Result<u64, RepositoryError>;
}

/// The set of repositories a running gateway talks to.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub readings: Arc<dyn SensorRepository>,
    pub chats: Arc<dyn ChatRepository>,
}

impl Repositories {
    /// Process-local store; contents are lost on shutdown.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::default()),
            readings: Arc::new(InMemorySensorRepository::default()),
            chats: Arc::new(InMemoryChatRepository::default()),
        }
    }

    /// PostgreSQL-backed repositories over one pool.
    #[cfg(feature = "persistence-sqlx")]
    pub fn sqlx(pool: DatabasePool) -> Self {
        Self {
            users: Arc::new(SqlxUserRepository::new(pool.clone())),
            readings: Arc::new(SqlxSensorRepository::new(pool.clone())),
            chats: Arc::new(SqlxChatRepository::new(pool)),
        }
    }

    /// Connect to `database_url` and create the schema, or fall back to the
    /// in-memory store when no URL is configured.
    pub async fn connect(database_url: Option<&str>) -> Result<Self, RepositoryError> {
        match database_url {
            #[cfg(feature = "persistence-sqlx")]
            Some(url) => {
                let pool = init_pool(url).await?;
                initialize_schema(&pool).await?;
                tracing::info!("connected to PostgreSQL");
                Ok(Self::sqlx(pool))
            }
            #[cfg(not(feature = "persistence-sqlx"))]
            Some(_) => {
                tracing::warn!(
                    "DATABASE_URL set but persistence-sqlx is disabled, using in-memory store"
                );
                Ok(Self::in_memory())
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                Ok(Self::in_memory())
            }
        }
    }
}

#[cfg(feature = "persistence-sqlx")]
fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(feature = "persistence-sqlx")]
fn reading_from_row(row: &PgRow) -> Result<SensorReading, sqlx::Error> {
    Ok(SensorReading {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        temperature: row.try_get("temperature")?,
        humidity: row.try_get("humidity")?,
        location: row.try_get("location")?,
        device_id: row.try_get("device_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(feature = "persistence-sqlx")]
fn chat_from_row(row: &PgRow) -> Result<ChatRecord, sqlx::Error> {
    Ok(ChatRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        message: row.try_get("message")?,
        response: row.try_get("response")?,
        model: row.try_get("model")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(feature = "persistence-sqlx")]
const USER_COLUMNS: &str = "id, name, email, created_at";
#[cfg(feature = "persistence-sqlx")]
const READING_COLUMNS: &str =
    "id, user_id, temperature, humidity, location, device_id, created_at, updated_at";
#[cfg(feature = "persistence-sqlx")]
const CHAT_COLUMNS: &str = "id, user_id, message, response, model, created_at";

/// SQLx/PostgreSQL implementation of [`UserRepository`].
#[cfg(feature = "persistence-sqlx")]
#[derive(Debug, Clone)]
pub struct SqlxUserRepository {
    pool: DatabasePool,
}

#[cfg(feature = "persistence-sqlx")]
impl SqlxUserRepository {
    /// Build a repository over an existing pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "persistence-sqlx")]
#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, name: &str, email: &str) -> Result<User, RepositoryError> {
        let user = User::new(name, email);
        let row = sqlx::query(&format!(
            "INSERT INTO users (id, name, email, created_at) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row)?)
    }

    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn first(&self) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }
}

/// SQLx/PostgreSQL implementation of [`SensorRepository`].
#[cfg(feature = "persistence-sqlx")]
#[derive(Debug, Clone)]
pub struct SqlxSensorRepository {
    pool: DatabasePool,
}

#[cfg(feature = "persistence-sqlx")]
impl SqlxSensorRepository {
    /// Build a repository over an existing pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "persistence-sqlx")]
#[async_trait]
impl SensorRepository for SqlxSensorRepository {
    async fn insert(&self, reading: SensorReading) -> Result<SensorReading, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO sensor_readings ({READING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {READING_COLUMNS}"
        ))
        .bind(&reading.id)
        .bind(&reading.user_id)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(&reading.location)
        .bind(&reading.device_id)
        .bind(reading.created_at)
        .bind(reading.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(reading_from_row(&row)?)
    }

    async fn latest(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SensorReading>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(reading_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings WHERE user_id = $1 AND created_at >= $2 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(reading_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sensor_readings WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sensor_readings")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

/// SQLx/PostgreSQL implementation of [`ChatRepository`].
#[cfg(feature = "persistence-sqlx")]
#[derive(Debug, Clone)]
pub struct SqlxChatRepository {
    pool: DatabasePool,
}

#[cfg(feature = "persistence-sqlx")]
impl SqlxChatRepository {
    /// Build a repository over an existing pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "persistence-sqlx")]
#[async_trait]
impl ChatRepository for SqlxChatRepository {
    async fn insert(&self, record: ChatRecord) -> Result<ChatRecord, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO chats ({CHAT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CHAT_COLUMNS}"
        ))
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.message)
        .bind(&record.response)
        .bind(&record.model)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(chat_from_row(&row)?)
    }

    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CHAT_COLUMNS} FROM (
                SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2
            ) recent ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(chat_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM chats WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
