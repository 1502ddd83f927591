use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{NewProductImage, Product, ProductForm, ProductImage, ProductListItem, ProductStatus},
};

pub async fn find_by_id<'e>(executor: impl PgExecutor<'e>, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(product)
}

/// Row-locks the product for the rest of the transaction.
pub async fn lock_by_id(conn: &mut PgConnection, id: i32) -> Result<Option<Product>> {
    let product =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

    Ok(product)
}

pub async fn find_active_by_code(pool: &PgPool, unique_code: &str) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE unique_code = $1 AND status = $2",
    )
    .bind(unique_code)
    .bind(ProductStatus::Active)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn list_products(pool: &PgPool, search: Option<&str>) -> Result<Vec<ProductListItem>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT p.*, u.name AS umkm_name
         FROM products p
         LEFT JOIN umkm_profiles u ON u.id = p.umkm_id
         WHERE 1=1",
    );

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = contains_pattern(term);
        query.push(" AND (p.name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(r" ESCAPE '\' OR p.unique_code ILIKE ");
        query.push_bind(pattern.clone());
        query.push(r" ESCAPE '\' OR u.name ILIKE ");
        query.push_bind(pattern);
        query.push(r" ESCAPE '\')");
    }

    query.push(" ORDER BY p.created_at DESC, p.id DESC");

    let products = query
        .build_query_as::<ProductListItem>()
        .fetch_all(pool)
        .await?;

    Ok(products)
}

/// `ILIKE` pattern matching `term` literally anywhere in the value.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn find_images_by_product_id<'e>(
    executor: impl PgExecutor<'e>,
    product_id: i32,
) -> Result<Vec<ProductImage>> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images
         WHERE product_id = $1
         ORDER BY sort_order ASC, id ASC",
    )
    .bind(product_id)
    .fetch_all(executor)
    .await?;

    Ok(images)
}

pub async fn insert_product(
    conn: &mut PgConnection,
    form: &ProductForm,
    unique_code: &str,
) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            umkm_id, name, description, history, philosophy, unique_code, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(form.umkm_id)
    .bind(&form.name)
    .bind(&form.description)
    .bind(&form.history)
    .bind(&form.philosophy)
    .bind(unique_code)
    .bind(ProductStatus::Active)
    .fetch_one(conn)
    .await?;

    Ok(product)
}

pub async fn update_product(
    conn: &mut PgConnection,
    id: i32,
    form: &ProductForm,
) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            umkm_id = $1,
            name = $2,
            description = $3,
            history = $4,
            philosophy = $5,
            status = COALESCE($6, status),
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(form.umkm_id)
    .bind(&form.name)
    .bind(&form.description)
    .bind(&form.history)
    .bind(&form.philosophy)
    .bind(form.status)
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(product)
}

pub async fn set_video_path(
    conn: &mut PgConnection,
    id: i32,
    video_path: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE products SET video_path = $1, updated_at = NOW() WHERE id = $2")
        .bind(video_path)
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn insert_image(
    conn: &mut PgConnection,
    product_id: i32,
    image: &NewProductImage,
) -> Result<ProductImage> {
    let image = sqlx::query_as::<_, ProductImage>(
        r#"
        INSERT INTO product_images (product_id, image_path, sort_order, is_featured)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(&image.image_path)
    .bind(image.sort_order)
    .bind(image.is_featured)
    .fetch_one(conn)
    .await?;

    Ok(image)
}

pub async fn delete_images(
    conn: &mut PgConnection,
    product_id: i32,
    image_ids: &[i32],
) -> Result<Vec<ProductImage>> {
    if image_ids.is_empty() {
        return Ok(Vec::new());
    }

    let deleted = sqlx::query_as::<_, ProductImage>(
        "DELETE FROM product_images WHERE product_id = $1 AND id = ANY($2) RETURNING *",
    )
    .bind(product_id)
    .bind(image_ids)
    .fetch_all(conn)
    .await?;

    Ok(deleted)
}

pub async fn delete_image(
    pool: &PgPool,
    product_id: i32,
    image_id: i32,
) -> Result<Option<ProductImage>> {
    let deleted = sqlx::query_as::<_, ProductImage>(
        "DELETE FROM product_images WHERE product_id = $1 AND id = $2 RETURNING *",
    )
    .bind(product_id)
    .bind(image_id)
    .fetch_optional(pool)
    .await?;

    Ok(deleted)
}

/// Makes `image_id` the only featured image of the product.
pub async fn set_featured_image(
    pool: &PgPool,
    product_id: i32,
    image_id: i32,
) -> Result<Option<ProductImage>> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM product_images WHERE product_id = $1 AND id = $2",
    )
    .bind(product_id)
    .bind(image_id)
    .fetch_optional(&mut *tx)
    .await?;

    if exists.is_none() {
        return Ok(None);
    }

    sqlx::query(
        "UPDATE product_images SET is_featured = FALSE, updated_at = NOW()
         WHERE product_id = $1 AND is_featured",
    )
    .bind(product_id)
    .execute(&mut *tx)
    .await?;

    let image = sqlx::query_as::<_, ProductImage>(
        "UPDATE product_images SET is_featured = TRUE, updated_at = NOW()
         WHERE product_id = $1 AND id = $2
         RETURNING *",
    )
    .bind(product_id)
    .bind(image_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(image))
}

/// Photo paths of every review on the product, whatever its status.
pub async fn find_review_image_paths(conn: &mut PgConnection, product_id: i32) -> Result<Vec<String>> {
    let paths = sqlx::query_scalar::<_, String>(
        "SELECT jsonb_array_elements_text(review_images) FROM reviews WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;

    Ok(paths)
}

pub async fn delete_product(conn: &mut PgConnection, id: i32) -> Result<Option<Product>> {
    let deleted = sqlx::query_as::<_, Product>("DELETE FROM products WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(deleted)
}
