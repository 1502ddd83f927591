use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Admin, DashboardStats, ReviewStatus},
};

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Admin>> {
    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE LOWER(email) = LOWER($1)")
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

    Ok(admin)
}

/// Inserts the admin unless the email is already taken. Returns whether a row was created.
pub async fn create_if_missing(pool: &PgPool, email: &str, password_hash: &str) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO admins (email, password) VALUES ($1, $2) ON CONFLICT (email) DO NOTHING",
    )
    .bind(email.trim())
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn dashboard_stats(pool: &PgPool) -> Result<DashboardStats> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM products)::BIGINT AS total_products,
            (SELECT COUNT(*) FROM reviews WHERE status = $1)::BIGINT AS pending_reviews,
            (SELECT COUNT(*) FROM qr_scans)::BIGINT AS total_scans,
            (SELECT COUNT(*) FROM umkm_profiles)::BIGINT AS total_umkm
        "#,
    )
    .bind(ReviewStatus::Pending)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
