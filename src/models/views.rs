use serde::Serialize;

use crate::models::{ImageView, Product, ReviewSummary, UmkmView};

// Public read views, one record type per product page.

/// `/product/{code}`
#[derive(Debug, Serialize)]
pub struct ProductPage {
    #[serde(flatten)]
    pub product: Product,
    pub video_url: Option<String>,
    pub umkm: UmkmView,
    pub images: Vec<ImageView>,
    #[serde(flatten)]
    pub reviews: ReviewSummary,
}

/// `/product/{code}/story` and `/product/{code}/gallery`
#[derive(Debug, Serialize)]
pub struct ProductWithImages {
    #[serde(flatten)]
    pub product: Product,
    pub video_url: Option<String>,
    pub images: Vec<ImageView>,
}

/// `/product/{code}/maker`
#[derive(Debug, Serialize)]
pub struct ProductWithUmkm {
    #[serde(flatten)]
    pub product: Product,
    pub umkm: UmkmView,
}

/// `/product/{code}/reviews`
#[derive(Debug, Serialize)]
pub struct ProductWithReviews {
    #[serde(flatten)]
    pub product: Product,
    #[serde(flatten)]
    pub reviews: ReviewSummary,
}
