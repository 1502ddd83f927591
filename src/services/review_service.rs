use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{Review, ReviewForm},
    queries::review_queries,
    services::storage_service::{self, MediaKind, ObjectStorage},
    utils::multipart::UploadedFile,
};

pub fn check_review_images(files: &[UploadedFile]) -> Result<()> {
    if let Some(file) = files.iter().find(|file| !file.is_image()) {
        return Err(AppError::BadRequest(format!(
            "{} is not an image",
            file.file_name.as_deref().unwrap_or("Uploaded file")
        )));
    }

    Ok(())
}

/// Uploads every review image or none: a failure removes what was already stored.
pub async fn upload_all(storage: &dyn ObjectStorage, files: &[UploadedFile]) -> Result<Vec<String>> {
    let mut uploaded = Vec::with_capacity(files.len());

    for file in files {
        match storage_service::upload(storage, MediaKind::ReviewImage, file).await {
            Ok(key) => uploaded.push(key),
            Err(e) => {
                storage_service::remove_best_effort(storage, &uploaded).await;
                return Err(e);
            }
        }
    }

    Ok(uploaded)
}

/// Stores a visitor review as pending, with its images.
pub async fn submit_review(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    product_id: i32,
    form: &ReviewForm,
    files: &[UploadedFile],
) -> Result<Review> {
    check_review_images(files)?;

    let image_paths = upload_all(storage, files).await?;

    match review_queries::insert_pending_review(pool, product_id, form, &image_paths).await {
        Ok(review) => {
            tracing::info!("Review {} submitted for product {}", review.id, product_id);
            Ok(review)
        }
        Err(e) => {
            storage_service::remove_best_effort(storage, &image_paths).await;
            Err(e)
        }
    }
}
