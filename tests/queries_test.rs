//! Runs against the database in `DATABASE_URL`; each test gets a fresh migrated schema.

use axum::body::Bytes;
use sqlx::PgPool;

use umkm_catalog::{
    models::{
        CreateUmkmRequest, MediaMode, Product, ProductForm, ProductStatus, ReviewCounts, ReviewForm,
        ReviewStatus,
    },
    queries::{product_queries, review_queries, umkm_queries},
    services::{
        media_service::{self, MediaUpload},
        review_service,
        storage_service::MemoryStorage,
    },
    utils::multipart::UploadedFile,
};

fn photo(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: Some(name.to_string()),
        content_type: "image/jpeg".to_string(),
        data: Bytes::from_static(b"jpeg"),
    }
}

fn clip(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: Some(name.to_string()),
        content_type: "video/mp4".to_string(),
        data: Bytes::from_static(b"mp4"),
    }
}

async fn seed_umkm(pool: &PgPool, name: &str) -> i32 {
    let request = CreateUmkmRequest {
        name: name.to_string(),
        owner_name: "Sri".to_string(),
        address: "Jl. Melati 3".to_string(),
        phone: "08123".to_string(),
        email: None,
        story: "Sejak 1998".to_string(),
        established_year: Some(1998),
    };

    umkm_queries::create_umkm(pool, &request).await.unwrap().id
}

fn product_form(umkm_id: i32, name: &str) -> ProductForm {
    ProductForm {
        umkm_id,
        name: name.to_string(),
        description: "Produk lokal".to_string(),
        history: "No history provided".to_string(),
        philosophy: "No philosophy provided".to_string(),
        status: None,
    }
}

async fn seed_product(
    pool: &PgPool,
    storage: &MemoryStorage,
    umkm_id: i32,
    name: &str,
    images: Vec<UploadedFile>,
) -> Product {
    let upload = MediaUpload {
        images,
        video: None,
    };

    media_service::create_product(pool, storage, &product_form(umkm_id, name), upload)
        .await
        .unwrap()
}

fn review(name: &str, rating: i32) -> ReviewForm {
    ReviewForm {
        customer_name: name.to_string(),
        rating,
        comment: "Enak".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn inactive_products_are_not_public(pool: PgPool) {
    let storage = MemoryStorage::default();
    let umkm_id = seed_umkm(&pool, "Dapur Bu Sri").await;
    let product = seed_product(&pool, &storage, umkm_id, "Kopi", Vec::new()).await;

    assert_eq!(product.status, ProductStatus::Active);
    assert!(
        product_queries::find_active_by_code(&pool, &product.unique_code)
            .await
            .unwrap()
            .is_some()
    );

    let mut form = product_form(umkm_id, "Kopi");
    form.status = Some(ProductStatus::Inactive);
    media_service::update_product(
        &pool,
        &storage,
        product.id,
        &form,
        MediaMode::Images,
        &[],
        MediaUpload::default(),
    )
    .await
    .unwrap();

    assert!(
        product_queries::find_active_by_code(&pool, &product.unique_code)
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn search_matches_wildcards_literally(pool: PgPool) {
    let storage = MemoryStorage::default();
    let umkm_id = seed_umkm(&pool, "Dapur Bu Sri").await;
    seed_product(&pool, &storage, umkm_id, "Kopi", Vec::new()).await;
    seed_product(&pool, &storage, umkm_id, "Teh", Vec::new()).await;

    for term in ["_", "%"] {
        let hits = product_queries::list_products(&pool, Some(term)).await.unwrap();
        assert!(hits.is_empty(), "{} matched {} products", term, hits.len());
    }

    let hits = product_queries::list_products(&pool, Some("kOPi")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product.name, "Kopi");

    let by_maker = product_queries::list_products(&pool, Some("bu sri")).await.unwrap();
    assert_eq!(by_maker.len(), 2);
    assert!(by_maker.iter().all(|item| item.umkm_name.as_deref() == Some("Dapur Bu Sri")));
}

#[sqlx::test(migrations = "./migrations")]
async fn submitted_reviews_wait_for_approval(pool: PgPool) {
    let storage = MemoryStorage::default();
    let umkm_id = seed_umkm(&pool, "Dapur Bu Sri").await;
    let product = seed_product(&pool, &storage, umkm_id, "Kopi", Vec::new()).await;

    let submitted = review_service::submit_review(
        &pool,
        &storage,
        product.id,
        &review("Rina", 4),
        &[photo("cup.jpg")],
    )
    .await
    .unwrap();

    assert_eq!(submitted.status, ReviewStatus::Pending);
    assert_eq!(submitted.review_images.0.len(), 1);
    assert!(
        review_queries::find_approved_by_product(&pool, product.id)
            .await
            .unwrap()
            .is_empty()
    );

    review_queries::update_status(&pool, submitted.id, ReviewStatus::Approved)
        .await
        .unwrap();

    let approved = review_queries::find_approved_by_product(&pool, product.id)
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, submitted.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn review_counts_are_grouped_by_status(pool: PgPool) {
    let storage = MemoryStorage::default();
    let umkm_id = seed_umkm(&pool, "Dapur Bu Sri").await;
    let product = seed_product(&pool, &storage, umkm_id, "Kopi", Vec::new()).await;

    let mut ids = Vec::new();
    for (name, rating) in [("A", 5), ("B", 4), ("C", 3), ("D", 2)] {
        let review = review_queries::insert_pending_review(&pool, product.id, &review(name, rating), &[])
            .await
            .unwrap();
        ids.push(review.id);
    }

    review_queries::update_status(&pool, ids[0], ReviewStatus::Approved).await.unwrap();
    review_queries::update_status(&pool, ids[1], ReviewStatus::Approved).await.unwrap();
    review_queries::update_status(&pool, ids[2], ReviewStatus::Rejected).await.unwrap();

    let grouped = review_queries::count_by_status(&pool).await.unwrap();

    assert_eq!(
        ReviewCounts::from_grouped(&grouped),
        ReviewCounts {
            all: 4,
            approved: 2,
            pending: 1,
            rejected: 1,
        }
    );

    let pending = review_queries::list_reviews(&pool, Some(ReviewStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].product_name.as_deref(), Some("Kopi"));
}

#[sqlx::test(migrations = "./migrations")]
async fn video_mode_edit_drops_every_image(pool: PgPool) {
    let storage = MemoryStorage::default();
    let umkm_id = seed_umkm(&pool, "Dapur Bu Sri").await;
    let product = seed_product(
        &pool,
        &storage,
        umkm_id,
        "Kopi",
        vec![photo("a.jpg"), photo("b.jpg")],
    )
    .await;
    assert_eq!(storage.keys().len(), 2);

    let updated = media_service::update_product(
        &pool,
        &storage,
        product.id,
        &product_form(umkm_id, "Kopi"),
        MediaMode::Video,
        &[],
        MediaUpload {
            images: vec![photo("ignored.jpg")],
            video: Some(clip("brew.mp4")),
        },
    )
    .await
    .unwrap();

    let images = product_queries::find_images_by_product_id(&pool, product.id)
        .await
        .unwrap();
    assert!(images.is_empty());

    let video = updated.video_path.unwrap();
    assert!(video.starts_with("products/videos/"));
    assert_eq!(storage.keys(), vec![video]);
}

#[sqlx::test(migrations = "./migrations")]
async fn exactly_one_image_is_featured(pool: PgPool) {
    let storage = MemoryStorage::default();
    let umkm_id = seed_umkm(&pool, "Dapur Bu Sri").await;
    let product = seed_product(
        &pool,
        &storage,
        umkm_id,
        "Kopi",
        vec![photo("a.jpg"), photo("b.jpg"), photo("c.jpg")],
    )
    .await;

    let images = product_queries::find_images_by_product_id(&pool, product.id)
        .await
        .unwrap();
    assert_eq!(images.iter().filter(|image| image.is_featured).count(), 1);
    assert!(images[0].is_featured);

    let last = images[2].id;
    let featured = product_queries::set_featured_image(&pool, product.id, last)
        .await
        .unwrap()
        .unwrap();
    assert!(featured.is_featured);

    let images = product_queries::find_images_by_product_id(&pool, product.id)
        .await
        .unwrap();
    let featured: Vec<i32> = images
        .iter()
        .filter(|image| image.is_featured)
        .map(|image| image.id)
        .collect();
    assert_eq!(featured, vec![last]);

    assert!(
        product_queries::set_featured_image(&pool, product.id, last + 100)
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_product_removes_review_photos(pool: PgPool) {
    let storage = MemoryStorage::default();
    let umkm_id = seed_umkm(&pool, "Dapur Bu Sri").await;
    let product = seed_product(&pool, &storage, umkm_id, "Kopi", vec![photo("a.jpg")]).await;

    review_service::submit_review(
        &pool,
        &storage,
        product.id,
        &review("Rina", 5),
        &[photo("cup.jpg")],
    )
    .await
    .unwrap();
    assert_eq!(storage.keys().len(), 2);

    let deleted = media_service::delete_product(&pool, &storage, product.id)
        .await
        .unwrap();

    assert_eq!(deleted.map(|p| p.id), Some(product.id));
    assert!(storage.keys().is_empty());
    assert!(
        product_queries::find_by_id(&pool, product.id)
            .await
            .unwrap()
            .is_none()
    );
}
