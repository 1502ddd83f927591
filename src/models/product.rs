use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    services::storage_service::public_url,
    utils::multipart::FormData,
};

// DB models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl FromStr for ProductStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            other => Err(AppError::BadRequest(format!("Invalid product status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub umkm_id: i32,
    pub name: String,
    pub description: String,
    pub history: String,
    pub philosophy: String,
    pub video_path: Option<String>,
    pub unique_code: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub image_path: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub umkm_name: Option<String>,
}

/// Image row to insert, positioned within the product gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductImage {
    pub image_path: String,
    pub sort_order: i32,
    pub is_featured: bool,
}

// Request types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    Images,
    Video,
}

impl FromStr for MediaMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "images" => Ok(MediaMode::Images),
            "video" => Ok(MediaMode::Video),
            other => Err(AppError::BadRequest(format!("Invalid media type: {}", other))),
        }
    }
}

const DEFAULT_HISTORY: &str = "No history provided";
const DEFAULT_PHILOSOPHY: &str = "No philosophy provided";

/// Validated text part of the product create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub umkm_id: i32,
    pub name: String,
    pub description: String,
    pub history: String,
    pub philosophy: String,
    pub status: Option<ProductStatus>,
}

impl ProductForm {
    pub fn from_form(form: &FormData) -> Result<Self> {
        let (Some(name), Some(description), Some(umkm_id)) = (
            form.text("name"),
            form.text("description"),
            form.text("umkm_id"),
        ) else {
            return Err(AppError::BadRequest(
                "Please fill in all required fields".to_string(),
            ));
        };

        let umkm_id = umkm_id
            .parse::<i32>()
            .map_err(|_| AppError::BadRequest("umkm_id must be a number".to_string()))?;

        let status = form.text("status").map(str::parse).transpose()?;

        Ok(Self {
            umkm_id,
            name: name.to_string(),
            description: description.to_string(),
            history: form.text("history").unwrap_or(DEFAULT_HISTORY).to_string(),
            philosophy: form
                .text("philosophy")
                .unwrap_or(DEFAULT_PHILOSOPHY)
                .to_string(),
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct ImageView {
    #[serde(flatten)]
    pub image: ProductImage,
    pub url: String,
}

impl ImageView {
    pub fn from_images(images: Vec<ProductImage>, assets_url: &str) -> Vec<Self> {
        images
            .into_iter()
            .map(|image| ImageView {
                url: public_url(assets_url, &image.image_path),
                image,
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub video_url: Option<String>,
    pub images: Vec<ImageView>,
}

impl ProductDetail {
    pub fn new(product: Product, images: Vec<ProductImage>, assets_url: &str) -> Self {
        Self {
            video_url: video_url(&product, assets_url),
            images: ImageView::from_images(images, assets_url),
            product,
        }
    }
}

pub fn video_url(product: &Product, assets_url: &str) -> Option<String> {
    product
        .video_path
        .as_deref()
        .map(|path| public_url(assets_url, path))
}

#[derive(Debug, Serialize)]
pub struct QrCodeInfo {
    pub product_id: i32,
    pub product_name: String,
    pub unique_code: String,
    pub product_url: String,
    pub download_url: String,
}
