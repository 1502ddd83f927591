use sqlx::PgPool;

use crate::{
    error::Result,
    models::{CreateUmkmRequest, UmkmProductSummary, UmkmProfile, UpdateUmkmRequest},
};

pub async fn get_all(pool: &PgPool) -> Result<Vec<UmkmProfile>> {
    let profiles =
        sqlx::query_as::<_, UmkmProfile>("SELECT * FROM umkm_profiles ORDER BY name ASC, id ASC")
            .fetch_all(pool)
            .await?;

    Ok(profiles)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<UmkmProfile>> {
    let profile = sqlx::query_as::<_, UmkmProfile>("SELECT * FROM umkm_profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(profile)
}

pub async fn create_umkm(pool: &PgPool, req: &CreateUmkmRequest) -> Result<UmkmProfile> {
    let profile = sqlx::query_as::<_, UmkmProfile>(
        r#"
        INSERT INTO umkm_profiles (
            name, owner_name, address, phone, email, story, established_year
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(req.name.trim())
    .bind(req.owner_name.trim())
    .bind(req.address.trim())
    .bind(req.phone.trim())
    .bind(req.email())
    .bind(req.story.trim())
    .bind(req.established_year)
    .fetch_one(pool)
    .await?;

    Ok(profile)
}

pub async fn update_umkm(
    pool: &PgPool,
    id: i32,
    req: &UpdateUmkmRequest,
) -> Result<Option<UmkmProfile>> {
    let profile = sqlx::query_as::<_, UmkmProfile>(
        r#"
        UPDATE umkm_profiles
        SET
            name = COALESCE($1, name),
            owner_name = COALESCE($2, owner_name),
            address = COALESCE($3, address),
            phone = COALESCE($4, phone),
            email = CASE WHEN $5::TEXT IS NULL THEN email ELSE NULLIF(TRIM($5), '') END,
            story = COALESCE($6, story),
            established_year = COALESCE($7, established_year),
            updated_at = NOW()
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.owner_name)
    .bind(&req.address)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.story)
    .bind(req.established_year)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub async fn set_logo_path(pool: &PgPool, id: i32, logo_path: &str) -> Result<Option<UmkmProfile>> {
    let profile = sqlx::query_as::<_, UmkmProfile>(
        "UPDATE umkm_profiles SET logo_path = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(logo_path)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub async fn get_products(pool: &PgPool, umkm_id: i32) -> Result<Vec<UmkmProductSummary>> {
    let products = sqlx::query_as::<_, UmkmProductSummary>(
        "SELECT id, name, status FROM products WHERE umkm_id = $1 ORDER BY name ASC",
    )
    .bind(umkm_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}
