use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
}

/// Establishes a connection pool to the PostgreSQL database.
///
/// The connection string comes from the settings, or from `DATABASE_URL`
/// (optionally loaded from a `.env` file). The pool can be shared across the
/// entire application.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let database_url = settings
        .connection_url()
        .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?;

    let pool = pool_options(settings).connect(&database_url).await?;
    tracing::info!(
        max_connections = settings.max_connections,
        "Connected to the database."
    );
    Ok(pool)
}

/// Builds a pool that opens connections on first use only.
pub fn connect_lazy(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let database_url = settings
        .connection_url()
        .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?;
    Ok(pool_options(settings).connect_lazy(&database_url)?)
}

/// A utility function to run database migrations automatically.
///
/// This is useful for ensuring the database schema is up-to-date when the application starts,
/// which is especially important in production deployments.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied.");
    Ok(())
}
