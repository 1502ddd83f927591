use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use aws_sdk_s3::{self as s3, primitives::ByteStream};
use axum::body::Bytes;
use uuid::Uuid;

use crate::{
    config::{StorageBackend, StorageConfig},
    error::{AppError, Result},
    utils::multipart::UploadedFile,
};

/// Object store holding every uploaded media file, keyed by path.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

pub type SharedStorage = Arc<dyn ObjectStorage>;

pub async fn build_storage(config: &StorageConfig) -> Result<SharedStorage> {
    match config.backend {
        StorageBackend::S3 => {
            let client = crate::config::load_s3_client(config).await?;
            Ok(Arc::new(S3Storage::new(client, config.bucket.clone())))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object storage, uploads are lost on restart");
            Ok(Arc::new(MemoryStorage::default()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    ProductImage,
    ProductVideo,
    ReviewImage,
    UmkmLogo,
}

impl MediaKind {
    pub fn prefix(self) -> &'static str {
        match self {
            MediaKind::ProductImage => "products/images",
            MediaKind::ProductVideo => "products/videos",
            MediaKind::ReviewImage => "reviews",
            MediaKind::UmkmLogo => "umkm/logos",
        }
    }
}

pub fn object_key(kind: MediaKind, file: &UploadedFile) -> String {
    format!("{}/{}.{}", kind.prefix(), Uuid::new_v4(), file.extension())
}

pub fn public_url(assets_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    format!("{}/{}", assets_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Uploads `file` under a fresh key and returns that key.
pub async fn upload(storage: &dyn ObjectStorage, kind: MediaKind, file: &UploadedFile) -> Result<String> {
    let key = object_key(kind, file);
    storage
        .put(&key, file.data.clone(), &file.content_type)
        .await?;

    Ok(key)
}

/// Removes every path, logging failures instead of returning them.
pub async fn remove_best_effort(storage: &dyn ObjectStorage, paths: &[String]) -> usize {
    let mut removed = 0;

    for path in paths {
        match storage.remove(path).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("Failed to remove stored object {}: {}", path, e),
        }
    }

    removed
}

pub struct S3Storage {
    client: s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to upload {}: {}", key, e)))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to delete {}: {}", key, e)))?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| AppError::StorageError("Object map poisoned".to_string()))?;

        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| AppError::StorageError("Object map poisoned".to_string()))?;

        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| AppError::StorageError(format!("Object {} does not exist", key)))
    }
}
