use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    config::{BootstrapAdmin, DatabaseConfig},
    error::{AppError, Result},
    queries::admin_queries,
};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to run migrations: {}", e)))?;

    tracing::info!(
        "Database connection established with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

/// Creates the configured admin account on first start.
pub async fn bootstrap_admin(pool: &PgPool, admin: &BootstrapAdmin) -> Result<()> {
    let hash = bcrypt::hash(&admin.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    if admin_queries::create_if_missing(pool, &admin.email, &hash).await? {
        tracing::info!("Created admin account {}", admin.email);
    }

    Ok(())
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
