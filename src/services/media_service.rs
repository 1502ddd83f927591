//! Product media lifecycle.
//!
//! Every mutation runs in three steps: new files are staged in object storage,
//! one database transaction swaps the references, and only after the commit are
//! the objects that lost their reference removed. A failed transaction removes
//! the staged objects again, so the database never points at missing files.

use sqlx::{PgConnection, PgPool};

use crate::{
    error::{AppError, Result},
    models::{MediaMode, NewProductImage, Product, ProductForm, ProductImage, UmkmProfile},
    queries::{product_queries, umkm_queries},
    services::storage_service::{self, MediaKind, ObjectStorage},
    utils::{
        multipart::{FormData, UploadedFile},
        unique_code::generate_unique_code,
    },
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VideoChange {
    #[default]
    Keep,
    Clear,
    Set(String),
}

/// Database changes for one media mutation plus the objects to drop after commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaPlan {
    pub delete_image_ids: Vec<i32>,
    pub new_images: Vec<NewProductImage>,
    pub video: VideoChange,
    pub obsolete_paths: Vec<String>,
}

/// Object keys uploaded for a mutation that is not committed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedMedia {
    pub images: Vec<String>,
    pub video: Option<String>,
}

impl StagedMedia {
    pub fn paths(&self) -> Vec<String> {
        self.images.iter().chain(self.video.iter()).cloned().collect()
    }
}

/// Media files submitted with the product form.
#[derive(Debug, Default)]
pub struct MediaUpload {
    pub images: Vec<UploadedFile>,
    pub video: Option<UploadedFile>,
}

impl MediaUpload {
    pub fn from_form(form: &mut FormData) -> Result<Self> {
        let images = form.take_files("images");
        let video = form.take_file("video");

        if let Some(file) = images.iter().find(|file| !file.is_image()) {
            return Err(AppError::BadRequest(format!(
                "{} is not an image",
                file.file_name.as_deref().unwrap_or("Uploaded file")
            )));
        }

        if let Some(ref file) = video {
            if !file.is_video() {
                return Err(AppError::BadRequest(format!(
                    "{} is not a video",
                    file.file_name.as_deref().unwrap_or("Uploaded file")
                )));
            }
        }

        Ok(Self { images, video })
    }

    /// A new product gets images or a video, never both.
    pub fn for_create(self) -> Result<Self> {
        if !self.images.is_empty() && self.video.is_some() {
            return Err(AppError::BadRequest(
                "Choose either images or a video, not both".to_string(),
            ));
        }

        Ok(self)
    }

    /// Drops the files that belong to the other media mode.
    pub fn for_mode(self, mode: MediaMode) -> Self {
        match mode {
            MediaMode::Images => {
                if self.video.is_some() {
                    tracing::debug!("Ignoring video upload in images mode");
                }
                Self {
                    images: self.images,
                    video: None,
                }
            }
            MediaMode::Video => {
                if !self.images.is_empty() {
                    tracing::debug!("Ignoring {} image uploads in video mode", self.images.len());
                }
                Self {
                    images: Vec::new(),
                    video: self.video,
                }
            }
        }
    }
}

/// Mode a product is edited in when the form does not say.
pub fn current_mode(product: &Product) -> MediaMode {
    if product.video_path.is_some() {
        MediaMode::Video
    } else {
        MediaMode::Images
    }
}

/// Uploads every file. A failed upload is logged and skipped.
pub async fn stage(storage: &dyn ObjectStorage, upload: MediaUpload) -> StagedMedia {
    let mut staged = StagedMedia::default();

    for file in &upload.images {
        match storage_service::upload(storage, MediaKind::ProductImage, file).await {
            Ok(key) => staged.images.push(key),
            Err(e) => tracing::error!(
                "Error uploading image {}: {}",
                file.file_name.as_deref().unwrap_or("<unnamed>"),
                e
            ),
        }
    }

    if let Some(ref file) = upload.video {
        match storage_service::upload(storage, MediaKind::ProductVideo, file).await {
            Ok(key) => staged.video = Some(key),
            Err(e) => tracing::error!(
                "Error uploading video {}: {}",
                file.file_name.as_deref().unwrap_or("<unnamed>"),
                e
            ),
        }
    }

    staged
}

pub fn plan_create(staged: &StagedMedia) -> MediaPlan {
    MediaPlan {
        new_images: numbered_images(&staged.images, 0, true),
        video: staged
            .video
            .clone()
            .map(VideoChange::Set)
            .unwrap_or_default(),
        ..MediaPlan::default()
    }
}

pub fn plan_edit(
    current_images: &[ProductImage],
    current_video: Option<&str>,
    mode: MediaMode,
    remove_image_ids: &[i32],
    staged: &StagedMedia,
) -> MediaPlan {
    let mut plan = MediaPlan::default();

    match mode {
        MediaMode::Images => {
            if let Some(video) = current_video {
                plan.video = VideoChange::Clear;
                plan.obsolete_paths.push(video.to_string());
            }

            for image in current_images
                .iter()
                .filter(|image| remove_image_ids.contains(&image.id))
            {
                plan.delete_image_ids.push(image.id);
                plan.obsolete_paths.push(image.image_path.clone());
            }

            let remaining = current_images.len() - plan.delete_image_ids.len();
            plan.new_images = numbered_images(&staged.images, remaining, remaining == 0);
        }
        MediaMode::Video => {
            for image in current_images {
                plan.delete_image_ids.push(image.id);
                plan.obsolete_paths.push(image.image_path.clone());
            }

            if let Some(ref video) = staged.video {
                plan.video = VideoChange::Set(video.clone());
                if let Some(previous) = current_video {
                    plan.obsolete_paths.push(previous.to_string());
                }
            }
        }
    }

    plan
}

fn numbered_images(paths: &[String], offset: usize, feature_first: bool) -> Vec<NewProductImage> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| NewProductImage {
            image_path: path.clone(),
            sort_order: (offset + i) as i32,
            is_featured: feature_first && i == 0,
        })
        .collect()
}

pub async fn apply_plan(conn: &mut PgConnection, product_id: i32, plan: &MediaPlan) -> Result<()> {
    product_queries::delete_images(&mut *conn, product_id, &plan.delete_image_ids).await?;

    for image in &plan.new_images {
        product_queries::insert_image(&mut *conn, product_id, image).await?;
    }

    match plan.video {
        VideoChange::Keep => {}
        VideoChange::Clear => product_queries::set_video_path(&mut *conn, product_id, None).await?,
        VideoChange::Set(ref path) => {
            product_queries::set_video_path(&mut *conn, product_id, Some(path.as_str())).await?
        }
    }

    Ok(())
}

/// Commit succeeded: drop obsolete objects. Commit failed: drop the staged ones.
async fn settle<T>(
    storage: &dyn ObjectStorage,
    staged: &StagedMedia,
    result: Result<(T, MediaPlan)>,
) -> Result<T> {
    match result {
        Ok((value, plan)) => {
            storage_service::remove_best_effort(storage, &plan.obsolete_paths).await;
            Ok(value)
        }
        Err(e) => {
            let discarded = storage_service::remove_best_effort(storage, &staged.paths()).await;
            if discarded > 0 {
                tracing::warn!("Discarded {} staged uploads after failed update", discarded);
            }
            Err(e)
        }
    }
}

pub async fn create_product(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    form: &ProductForm,
    upload: MediaUpload,
) -> Result<Product> {
    let staged = stage(storage, upload).await;
    let plan = plan_create(&staged);

    let result: Result<(Product, MediaPlan)> = async {
        let mut tx = pool.begin().await?;

        let product =
            product_queries::insert_product(&mut *tx, form, &generate_unique_code()).await?;
        apply_plan(&mut *tx, product.id, &plan).await?;

        let product = product_queries::find_by_id(&mut *tx, product.id)
            .await?
            .ok_or_else(|| AppError::InternalError("Created product vanished".to_string()))?;

        tx.commit().await?;

        tracing::info!(
            "Created product {} ({}) with {} images",
            product.id,
            product.unique_code,
            plan.new_images.len()
        );

        Ok((product, plan.clone()))
    }
    .await;

    settle(storage, &staged, result).await
}

pub async fn update_product(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    product_id: i32,
    form: &ProductForm,
    mode: MediaMode,
    remove_image_ids: &[i32],
    upload: MediaUpload,
) -> Result<Product> {
    let staged = stage(storage, upload.for_mode(mode)).await;

    let result: Result<(Product, MediaPlan)> = async {
        let mut tx = pool.begin().await?;

        let current = product_queries::lock_by_id(&mut *tx, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", product_id)))?;
        let current_images = product_queries::find_images_by_product_id(&mut *tx, product_id).await?;

        let plan = plan_edit(
            &current_images,
            current.video_path.as_deref(),
            mode,
            remove_image_ids,
            &staged,
        );

        product_queries::update_product(&mut *tx, product_id, form).await?;
        apply_plan(&mut *tx, product_id, &plan).await?;

        let product = product_queries::find_by_id(&mut *tx, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", product_id)))?;

        tx.commit().await?;

        Ok((product, plan))
    }
    .await;

    settle(storage, &staged, result).await
}

/// Deletes the product row and then, best-effort, every object it or its reviews referenced.
pub async fn delete_product(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    product_id: i32,
) -> Result<Option<Product>> {
    let mut tx = pool.begin().await?;

    let images = product_queries::find_images_by_product_id(&mut *tx, product_id).await?;
    let review_photos = product_queries::find_review_image_paths(&mut *tx, product_id).await?;

    let Some(product) = product_queries::delete_product(&mut *tx, product_id).await? else {
        return Ok(None);
    };

    tx.commit().await?;

    let paths = owned_paths(&product, images, review_photos);
    let removed = storage_service::remove_best_effort(storage, &paths).await;
    tracing::debug!("Removed {} of {} objects of product {}", removed, paths.len(), product_id);

    Ok(Some(product))
}

/// Every stored object a product row and its cascaded rows point to.
fn owned_paths(product: &Product, images: Vec<ProductImage>, review_photos: Vec<String>) -> Vec<String> {
    images
        .into_iter()
        .map(|image| image.image_path)
        .chain(product.video_path.clone())
        .chain(review_photos)
        .collect()
}

pub async fn delete_image(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    product_id: i32,
    image_id: i32,
) -> Result<Option<ProductImage>> {
    let deleted = product_queries::delete_image(pool, product_id, image_id).await?;

    if let Some(ref image) = deleted {
        storage_service::remove_best_effort(storage, std::slice::from_ref(&image.image_path))
            .await;
    }

    Ok(deleted)
}

/// Uploads a new UMKM logo, swaps the reference and drops the previous logo.
pub async fn replace_logo(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    profile: &UmkmProfile,
    logo: &UploadedFile,
) -> Result<UmkmProfile> {
    let key = storage_service::upload(storage, MediaKind::UmkmLogo, logo).await?;

    let staged = StagedMedia {
        images: vec![key.clone()],
        video: None,
    };

    let result: Result<(UmkmProfile, MediaPlan)> = async {
        let updated = umkm_queries::set_logo_path(pool, profile.id, &key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("UMKM with id {} not found", profile.id)))?;

        let plan = MediaPlan {
            obsolete_paths: profile.logo_path.iter().cloned().collect(),
            ..MediaPlan::default()
        };

        Ok((updated, plan))
    }
    .await;

    settle(storage, &staged, result).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Bytes;
    use chrono::Utc;

    use super::*;
    use crate::services::storage_service::MemoryStorage;

    fn image(id: i32, path: &str, sort_order: i32, is_featured: bool) -> ProductImage {
        ProductImage {
            id,
            product_id: 1,
            image_path: path.to_string(),
            alt_text: None,
            sort_order,
            is_featured,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn file(name: &str, content_type: &str) -> UploadedFile {
        UploadedFile {
            file_name: Some(name.to_string()),
            content_type: content_type.to_string(),
            data: Bytes::from_static(b"bytes"),
        }
    }

    fn staged(images: &[&str], video: Option<&str>) -> StagedMedia {
        StagedMedia {
            images: images.iter().map(|s| s.to_string()).collect(),
            video: video.map(str::to_string),
        }
    }

    /// Refuses any body equal to `broken`.
    struct FlakyStorage {
        inner: MemoryStorage,
    }

    #[async_trait]
    impl ObjectStorage for FlakyStorage {
        async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
            if body.as_ref() == b"broken" {
                return Err(AppError::StorageError(format!("refused {}", key)));
            }
            self.inner.put(key, body, content_type).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }
    }

    #[test]
    fn create_features_only_the_first_image() {
        let plan = plan_create(&staged(&["a.jpg", "b.jpg", "c.jpg"], None));

        assert_eq!(plan.new_images.len(), 3);
        assert!(plan.new_images[0].is_featured);
        assert!(plan.new_images[1..].iter().all(|img| !img.is_featured));
        assert_eq!(
            plan.new_images.iter().map(|img| img.sort_order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(plan.video, VideoChange::Keep);
        assert!(plan.obsolete_paths.is_empty());
    }

    #[test]
    fn create_with_video_sets_reference() {
        let plan = plan_create(&staged(&[], Some("products/videos/v.mp4")));

        assert!(plan.new_images.is_empty());
        assert_eq!(plan.video, VideoChange::Set("products/videos/v.mp4".to_string()));
    }

    #[test]
    fn switching_to_images_clears_the_video() {
        let plan = plan_edit(
            &[],
            Some("products/videos/old.mp4"),
            MediaMode::Images,
            &[],
            &staged(&["products/images/n.jpg"], None),
        );

        assert_eq!(plan.video, VideoChange::Clear);
        assert_eq!(plan.obsolete_paths, vec!["products/videos/old.mp4".to_string()]);
        assert_eq!(
            plan.new_images,
            vec![NewProductImage {
                image_path: "products/images/n.jpg".to_string(),
                sort_order: 0,
                is_featured: true,
            }]
        );
    }

    #[test]
    fn appended_images_follow_remaining_ones() {
        let current = [
            image(1, "products/images/1.jpg", 0, true),
            image(2, "products/images/2.jpg", 1, false),
            image(3, "products/images/3.jpg", 2, false),
        ];

        let plan = plan_edit(
            &current,
            None,
            MediaMode::Images,
            &[2, 99],
            &staged(&["products/images/new.jpg"], None),
        );

        assert_eq!(plan.delete_image_ids, vec![2]);
        assert_eq!(plan.obsolete_paths, vec!["products/images/2.jpg".to_string()]);
        assert_eq!(plan.video, VideoChange::Keep);
        assert_eq!(plan.new_images[0].sort_order, 2);
        assert!(!plan.new_images[0].is_featured);
    }

    #[test]
    fn removing_the_only_image_leaves_no_media() {
        let current = [image(5, "products/images/only.jpg", 0, true)];

        let plan = plan_edit(&current, None, MediaMode::Images, &[5], &StagedMedia::default());

        assert_eq!(plan.delete_image_ids, vec![5]);
        assert!(plan.new_images.is_empty());
        assert_eq!(plan.video, VideoChange::Keep);
    }

    #[test]
    fn switching_to_video_drops_every_image() {
        let current = [
            image(1, "products/images/1.jpg", 0, true),
            image(2, "products/images/2.jpg", 1, false),
        ];

        let plan = plan_edit(
            &current,
            None,
            MediaMode::Video,
            &[],
            &staged(&[], Some("products/videos/new.mp4")),
        );

        assert_eq!(plan.delete_image_ids, vec![1, 2]);
        assert!(plan.new_images.is_empty());
        assert_eq!(plan.video, VideoChange::Set("products/videos/new.mp4".to_string()));
        assert_eq!(
            plan.obsolete_paths,
            vec![
                "products/images/1.jpg".to_string(),
                "products/images/2.jpg".to_string()
            ]
        );
    }

    #[test]
    fn video_mode_without_new_file_keeps_reference() {
        let plan = plan_edit(
            &[],
            Some("products/videos/old.mp4"),
            MediaMode::Video,
            &[],
            &StagedMedia::default(),
        );

        assert_eq!(plan.video, VideoChange::Keep);
        assert!(plan.obsolete_paths.is_empty());
    }

    #[test]
    fn replacing_a_video_retires_the_old_one() {
        let plan = plan_edit(
            &[],
            Some("products/videos/old.mp4"),
            MediaMode::Video,
            &[],
            &staged(&[], Some("products/videos/new.mp4")),
        );

        assert_eq!(plan.video, VideoChange::Set("products/videos/new.mp4".to_string()));
        assert_eq!(plan.obsolete_paths, vec!["products/videos/old.mp4".to_string()]);
    }

    #[test]
    fn create_rejects_images_and_video_together() {
        let upload = MediaUpload {
            images: vec![file("a.jpg", "image/jpeg")],
            video: Some(file("v.mp4", "video/mp4")),
        };

        assert!(matches!(upload.for_create(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn mode_filters_out_other_media() {
        let upload = MediaUpload {
            images: vec![file("a.jpg", "image/jpeg")],
            video: Some(file("v.mp4", "video/mp4")),
        };

        let images_only = upload.for_mode(MediaMode::Images);
        assert_eq!(images_only.images.len(), 1);
        assert!(images_only.video.is_none());
    }

    #[test]
    fn form_files_are_checked_by_kind() {
        let mut form = FormData::default();
        form.push_file("images", file("notes.pdf", "application/pdf"));
        assert!(MediaUpload::from_form(&mut form).is_err());

        let mut form = FormData::default();
        form.push_file("video", file("a.jpg", "image/jpeg"));
        assert!(MediaUpload::from_form(&mut form).is_err());

        let mut form = FormData::default();
        form.push_file("images", file("a.jpg", "image/jpeg"));
        form.push_file("images", file("b.png", "image/png"));
        let upload = MediaUpload::from_form(&mut form).unwrap();
        assert_eq!(upload.images.len(), 2);
        assert!(upload.video.is_none());
    }

    #[tokio::test]
    async fn failed_uploads_are_skipped() {
        let storage = FlakyStorage {
            inner: MemoryStorage::default(),
        };

        let mut broken = file("b.jpg", "image/jpeg");
        broken.data = Bytes::from_static(b"broken");

        let upload = MediaUpload {
            images: vec![file("a.jpg", "image/jpeg"), broken, file("c.jpg", "image/jpeg")],
            video: None,
        };

        let staged = stage(&storage, upload).await;

        assert_eq!(staged.images.len(), 2);
        assert_eq!(storage.inner.keys().len(), 2);

        let plan = plan_create(&staged);
        assert!(plan.new_images[0].is_featured);
        assert_eq!(plan.new_images[1].sort_order, 1);
    }

    #[tokio::test]
    async fn failed_commit_discards_staged_uploads() {
        let storage = Arc::new(MemoryStorage::default());
        let upload = MediaUpload {
            images: vec![file("a.jpg", "image/jpeg")],
            video: None,
        };

        let staged = stage(storage.as_ref(), upload).await;
        assert_eq!(storage.keys().len(), 1);

        let result: Result<(i32, MediaPlan)> =
            Err(AppError::InternalError("transaction aborted".to_string()));
        assert!(settle(storage.as_ref(), &staged, result).await.is_err());

        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn successful_commit_drops_obsolete_objects_only() {
        let storage = MemoryStorage::default();
        for key in ["products/images/old.jpg", "products/images/new.jpg"] {
            storage
                .put(key, Bytes::from_static(b"x"), "image/jpeg")
                .await
                .unwrap();
        }

        let staged = staged(&["products/images/new.jpg"], None);
        let plan = MediaPlan {
            obsolete_paths: vec!["products/images/old.jpg".to_string()],
            ..MediaPlan::default()
        };

        let value = settle(&storage, &staged, Ok((7, plan))).await.unwrap();

        assert_eq!(value, 7);
        assert_eq!(storage.keys(), vec!["products/images/new.jpg".to_string()]);
    }

    #[test]
    fn product_delete_covers_review_photos() {
        let product = Product {
            id: 1,
            umkm_id: 1,
            name: "Kopi".to_string(),
            description: "Robusta".to_string(),
            history: "No history provided".to_string(),
            philosophy: "No philosophy provided".to_string(),
            video_path: Some("products/videos/v.mp4".to_string()),
            unique_code: "Ab3dE5gH9k".to_string(),
            status: crate::models::ProductStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let paths = owned_paths(
            &product,
            vec![image(1, "products/images/1.jpg", 0, true)],
            vec!["reviews/r1.jpg".to_string(), "reviews/r2.jpg".to_string()],
        );

        assert_eq!(
            paths,
            vec![
                "products/images/1.jpg".to_string(),
                "products/videos/v.mp4".to_string(),
                "reviews/r1.jpg".to_string(),
                "reviews/r2.jpg".to_string(),
            ]
        );
    }
}
