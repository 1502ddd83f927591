use axum::{
    Json,
    extract::{Path, State},
};
use http::HeaderMap;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        ClientInfo, ImageView, Product, ProductPage, ProductWithImages, ProductWithReviews,
        ProductWithUmkm, ReviewSummary, UmkmView, video_url,
    },
    queries::{product_queries, review_queries, scan_queries, umkm_queries},
};

async fn active_product(state: &AppState, code: &str) -> Result<Product> {
    product_queries::find_active_by_code(&state.db, code)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

async fn maker_of(state: &AppState, product: &Product) -> Result<UmkmView> {
    let profile = umkm_queries::find_by_id(&state.db, product.umkm_id)
        .await?
        .ok_or_else(|| AppError::NotFound("UMKM not found".to_string()))?;

    Ok(UmkmView::new(profile, &state.assets_url))
}

async fn images_of(state: &AppState, product: &Product) -> Result<Vec<ImageView>> {
    let images = product_queries::find_images_by_product_id(&state.db, product.id).await?;

    Ok(ImageView::from_images(images, &state.assets_url))
}

async fn approved_reviews_of(state: &AppState, product: &Product) -> Result<ReviewSummary> {
    let reviews = review_queries::find_approved_by_product(&state.db, product.id).await?;

    Ok(ReviewSummary::from_approved(reviews, &state.assets_url))
}

/// Landing page of a scanned QR code. Every visit is logged as a scan.
pub async fn product_page(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ProductPage>> {
    let product = active_product(&state, &code).await?;

    let client = ClientInfo::from_headers(&headers);
    if let Err(e) = scan_queries::record_scan(&state.db, product.id, &client).await {
        tracing::warn!("Failed to record scan for product {}: {}", product.id, e);
    }

    let umkm = maker_of(&state, &product).await?;
    let images = images_of(&state, &product).await?;
    let reviews = approved_reviews_of(&state, &product).await?;

    Ok(Json(ProductPage {
        video_url: video_url(&product, &state.assets_url),
        product,
        umkm,
        images,
        reviews,
    }))
}

pub async fn product_story(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ProductWithImages>> {
    let product = active_product(&state, &code).await?;
    let images = images_of(&state, &product).await?;

    Ok(Json(ProductWithImages {
        video_url: None,
        product,
        images,
    }))
}

pub async fn product_gallery(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ProductWithImages>> {
    let product = active_product(&state, &code).await?;
    let images = images_of(&state, &product).await?;

    Ok(Json(ProductWithImages {
        video_url: video_url(&product, &state.assets_url),
        product,
        images,
    }))
}

pub async fn product_maker(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ProductWithUmkm>> {
    let product = active_product(&state, &code).await?;
    let umkm = maker_of(&state, &product).await?;

    Ok(Json(ProductWithUmkm { product, umkm }))
}

pub async fn product_reviews(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ProductWithReviews>> {
    let product = active_product(&state, &code).await?;
    let reviews = approved_reviews_of(&state, &product).await?;

    Ok(Json(ProductWithReviews { product, reviews }))
}
