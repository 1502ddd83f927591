use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{CreateUmkmRequest, UmkmDetail, UmkmView, UpdateUmkmRequest},
    queries::umkm_queries,
    services::media_service,
    utils::multipart::FormData,
};

pub async fn list_umkm(State(state): State<AppState>) -> Result<Json<Vec<UmkmView>>> {
    let profiles = umkm_queries::get_all(&state.db).await?;

    Ok(Json(
        profiles
            .into_iter()
            .map(|profile| UmkmView::new(profile, &state.assets_url))
            .collect(),
    ))
}

pub async fn get_umkm(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UmkmDetail>> {
    let profile = umkm_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("UMKM with id {} not found", id)))?;

    let products = umkm_queries::get_products(&state.db, id).await?;

    Ok(Json(UmkmDetail {
        umkm: UmkmView::new(profile, &state.assets_url),
        products,
    }))
}

pub async fn create_umkm(
    State(state): State<AppState>,
    Json(payload): Json<CreateUmkmRequest>,
) -> Result<(StatusCode, Json<UmkmView>)> {
    payload.validate()?;

    let profile = umkm_queries::create_umkm(&state.db, &payload).await?;

    tracing::info!("Created UMKM {} ({})", profile.id, profile.name);

    Ok((
        StatusCode::CREATED,
        Json(UmkmView::new(profile, &state.assets_url)),
    ))
}

pub async fn update_umkm(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUmkmRequest>,
) -> Result<Json<UmkmView>> {
    payload.validate()?;

    let profile = umkm_queries::update_umkm(&state.db, id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("UMKM with id {} not found", id)))?;

    Ok(Json(UmkmView::new(profile, &state.assets_url)))
}

pub async fn upload_logo(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<UmkmView>> {
    let mut form = FormData::read(multipart).await?;

    let logo = form
        .take_file("logo")
        .ok_or_else(|| AppError::BadRequest("logo file is required".to_string()))?;

    if !logo.is_image() {
        return Err(AppError::BadRequest("Logo must be an image".to_string()));
    }

    let profile = umkm_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("UMKM with id {} not found", id)))?;

    let profile =
        media_service::replace_logo(&state.db, state.storage.as_ref(), &profile, &logo).await?;

    Ok(Json(UmkmView::new(profile, &state.assets_url)))
}
