//! PostgreSQL pool, schema migrations and the health check

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to run migrations: {0}")]
    MigrationError(String),

    #[error("Database health check failed: {0}")]
    HealthCheckError(String),
}

/// Open the shared pool. Fails fast if the server cannot be reached.
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))
}

/// Apply pending migrations from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("./migrations");
    tracing::info!(available = migrator.iter().count(), "Applying migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationError(e.to_string()))
}

/// Round-trip a trivial query and report how long it took
pub async fn check_health(pool: &PgPool) -> Result<Duration, DbError> {
    let start = Instant::now();

    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| DbError::HealthCheckError(e.to_string()))?;

    Ok(start.elapsed())
}
