use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use emogo_core::config::StoreConfig;

use crate::record_store::StoreError;

/// Create a PostgreSQL connection pool and run migrations.
pub async fn connect(config: &StoreConfig) -> Result<PgPool, StoreError> {
    if !config.is_configured() {
        return Err(StoreError::Unavailable(
            "DATABASE_URL (or PG_USERNAME and PG_* settings) is required for the postgres store".into(),
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.connection_string())
        .await?;
    info!(host = %config.host, max_connections = config.max_connections, "PostgreSQL connected");

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}
