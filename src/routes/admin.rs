use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};
use http::{StatusCode, header};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        DashboardStats, MediaMode, ProductDetail, ProductForm, ProductImage, ProductListItem,
        ProductQuery, QrCodeInfo,
    },
    queries::{admin_queries, product_queries, umkm_queries},
    services::{
        media_service::{self, MediaUpload},
        qr_service,
    },
    utils::multipart::FormData,
};

//DASHBOARD
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let stats = admin_queries::dashboard_stats(&state.db).await?;

    Ok(Json(stats))
}

//PRODUCT ROUTES
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<Vec<ProductListItem>>> {
    let products = product_queries::list_products(&state.db, params.search.as_deref()).await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetail>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    let images = product_queries::find_images_by_product_id(&state.db, id).await?;

    Ok(Json(ProductDetail::new(product, images, &state.assets_url)))
}

pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductDetail>)> {
    let mut form = FormData::read(multipart).await?;
    let fields = ProductForm::from_form(&form)?;
    let upload = MediaUpload::from_form(&mut form)?.for_create()?;

    if umkm_queries::find_by_id(&state.db, fields.umkm_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "UMKM with id {} not found",
            fields.umkm_id
        )));
    }

    let product =
        media_service::create_product(&state.db, state.storage.as_ref(), &fields, upload).await?;
    let images = product_queries::find_images_by_product_id(&state.db, product.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductDetail::new(product, images, &state.assets_url)),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ProductDetail>> {
    let mut form = FormData::read(multipart).await?;
    let fields = ProductForm::from_form(&form)?;
    let mode = form
        .text("media_type")
        .map(str::parse::<MediaMode>)
        .transpose()?;
    let remove_image_ids = form
        .list("remove_image_ids")
        .into_iter()
        .map(|raw| {
            raw.parse::<i32>()
                .map_err(|_| AppError::BadRequest(format!("Invalid image id: {}", raw)))
        })
        .collect::<Result<Vec<_>>>()?;
    let upload = MediaUpload::from_form(&mut form)?;

    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    if fields.umkm_id != product.umkm_id
        && umkm_queries::find_by_id(&state.db, fields.umkm_id).await?.is_none()
    {
        return Err(AppError::NotFound(format!(
            "UMKM with id {} not found",
            fields.umkm_id
        )));
    }

    let mode = mode.unwrap_or_else(|| media_service::current_mode(&product));

    let product = media_service::update_product(
        &state.db,
        state.storage.as_ref(),
        id,
        &fields,
        mode,
        &remove_image_ids,
        upload,
    )
    .await?;
    let images = product_queries::find_images_by_product_id(&state.db, id).await?;

    Ok(Json(ProductDetail::new(product, images, &state.assets_url)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    media_service::delete_product(&state.db, state.storage.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    tracing::info!("Deleted product {}", id);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_product_image(
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(i32, i32)>,
) -> Result<StatusCode> {
    media_service::delete_image(&state.db, state.storage.as_ref(), product_id, image_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Image {} not found for product {}",
                image_id, product_id
            ))
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_featured_image(
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(i32, i32)>,
) -> Result<Json<ProductImage>> {
    let image = product_queries::set_featured_image(&state.db, product_id, image_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Image {} not found for product {}",
                image_id, product_id
            ))
        })?;

    Ok(Json(image))
}

//QR ROUTES
pub async fn qr_code_info(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<QrCodeInfo>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(QrCodeInfo {
        product_id: product.id,
        product_url: qr_service::product_url(&state.public_base_url, &product.unique_code),
        download_url: format!("/admin/products/{}/qr/download", product.id),
        product_name: product.name,
        unique_code: product.unique_code,
    }))
}

pub async fn download_qr_code(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    let url = qr_service::product_url(&state.public_base_url, &product.unique_code);
    let png = qr_service::render_png(&url)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        qr_service::download_file_name(&product.unique_code)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    ))
}
