use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use crate::{
    error::Result,
    models::{Review, ReviewForm, ReviewStatus, ReviewWithProduct},
};

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(review)
}

pub async fn list_reviews(
    pool: &PgPool,
    status: Option<ReviewStatus>,
) -> Result<Vec<ReviewWithProduct>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.*, p.name AS product_name
         FROM reviews r
         LEFT JOIN products p ON p.id = r.product_id
         WHERE 1=1",
    );

    if let Some(status) = status {
        query.push(" AND r.status = ");
        query.push_bind(status);
    }

    query.push(" ORDER BY r.created_at DESC, r.id DESC");

    let reviews = query
        .build_query_as::<ReviewWithProduct>()
        .fetch_all(pool)
        .await?;

    Ok(reviews)
}

pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(ReviewStatus, i64)>> {
    let counts = sqlx::query_as::<_, (ReviewStatus, i64)>(
        "SELECT status, COUNT(*)::BIGINT FROM reviews GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

/// Approved reviews of one product, newest first.
pub async fn find_approved_by_product(pool: &PgPool, product_id: i32) -> Result<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews
         WHERE product_id = $1 AND status = $2
         ORDER BY created_at DESC, id DESC",
    )
    .bind(product_id)
    .bind(ReviewStatus::Approved)
    .fetch_all(pool)
    .await?;

    Ok(reviews)
}

/// Public submissions always enter the moderation queue as pending.
pub async fn insert_pending_review(
    pool: &PgPool,
    product_id: i32,
    form: &ReviewForm,
    image_paths: &[String],
) -> Result<Review> {
    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (product_id, customer_name, rating, comment, review_images, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(&form.customer_name)
    .bind(form.rating)
    .bind(&form.comment)
    .bind(Json(image_paths))
    .bind(ReviewStatus::Pending)
    .fetch_one(pool)
    .await?;

    Ok(review)
}

pub async fn update_status(pool: &PgPool, id: i32, status: ReviewStatus) -> Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(
        "UPDATE reviews SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(review)
}

pub async fn delete_review(pool: &PgPool, id: i32) -> Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>("DELETE FROM reviews WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(review)
}
