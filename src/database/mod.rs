use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config;

pub mod models;
pub mod repositories;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// True when the underlying error is a unique-constraint violation.
    /// Repositories use this to turn constraint races into domain conflicts.
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false)
    }
}

static POOL: OnceLock<PgPool> = OnceLock::new();

/// Shared connection pool, created lazily from DATABASE_URL on first access.
/// Connections are only opened when a query actually runs, so the router can
/// be constructed (and non-database paths exercised) without a live server.
pub fn pool() -> Result<&'static PgPool, DbError> {
    if let Some(pool) = POOL.get() {
        return Ok(pool);
    }

    let url =
        std::env::var("DATABASE_URL").map_err(|_| DbError::ConfigMissing("DATABASE_URL"))?;

    let db_config = &config::config().database;
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
        .connect_lazy(&url)?;

    info!("Created database pool (max_connections={})", db_config.max_connections);
    Ok(POOL.get_or_init(|| pool))
}

/// Pings the database to ensure connectivity
pub async fn health_check() -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool()?).await?;
    Ok(())
}

/// Apply pending schema migrations from ./migrations
pub async fn run_migrations() -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool()?)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;
    info!("Database migrations are up to date");
    Ok(())
}
