use sqlx::PgPool;

use crate::{
    error::Result,
    models::{ClientInfo, QrScan},
};

pub async fn record_scan(pool: &PgPool, product_id: i32, client: &ClientInfo) -> Result<QrScan> {
    let scan = sqlx::query_as::<_, QrScan>(
        r#"
        INSERT INTO qr_scans (product_id, scanned_at, ip_address, user_agent)
        VALUES ($1, NOW(), $2, $3)
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(&client.ip_address)
    .bind(&client.user_agent)
    .fetch_one(pool)
    .await?;

    Ok(scan)
}
