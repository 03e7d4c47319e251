pub mod polls;
pub mod votes;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub use sqlx::Error as SqlxError;

pub type DbPool = sqlx::SqlitePool;

/// How long a connection waits on another writer's lock before SQLite reports `BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// SQLITE_BUSY, SQLITE_LOCKED and their extended codes.
const CONTENTION_CODES: [&str; 5] = ["5", "6", "261", "262", "517"];

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl DbError {
    /// Lock contention or pool exhaustion; the transaction can be retried as-is.
    pub fn is_busy(&self) -> bool {
        match self {
            DbError::Sqlx(sqlx::Error::PoolTimedOut) => true,
            DbError::Sqlx(sqlx::Error::Database(err)) => err
                .code()
                .map(|code| CONTENTION_CODES.iter().any(|busy| *busy == code))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::Sqlx(sqlx::Error::Database(err)) if err.is_unique_violation())
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations: applied successfully");
    Ok(())
}

/// Round-trip a trivial query; used by health checks.
pub async fn ping(pool: &DbPool) -> Result<(), DbError> {
    let _: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}
