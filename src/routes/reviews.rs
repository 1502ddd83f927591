use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        Review, ReviewCounts, ReviewForm, ReviewListQuery, ReviewListResponse,
        UpdateReviewStatusRequest,
    },
    queries::{product_queries, review_queries},
    services::{review_service, storage_service},
    utils::multipart::FormData,
};

//MODERATION
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewListQuery>,
) -> Result<Json<ReviewListResponse>> {
    let reviews = review_queries::list_reviews(&state.db, params.status.status()).await?;
    let counts = review_queries::count_by_status(&state.db).await?;

    Ok(Json(ReviewListResponse {
        reviews,
        counts: ReviewCounts::from_grouped(&counts),
    }))
}

pub async fn update_review_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReviewStatusRequest>,
) -> Result<Json<Review>> {
    let review = review_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))?;

    if !review.status.can_transition_to(payload.status) {
        return Err(AppError::BadRequest(format!(
            "Cannot change review status from {} to {}",
            review.status.as_str(),
            payload.status.as_str()
        )));
    }

    let review = review_queries::update_status(&state.db, id, payload.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))?;

    tracing::info!("Review {} is now {}", id, review.status.as_str());

    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let review = review_queries::delete_review(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))?;

    storage_service::remove_best_effort(state.storage.as_ref(), &review.review_images.0).await;

    Ok(StatusCode::NO_CONTENT)
}

//PUBLIC SUBMISSION
pub async fn submit_review(
    State(state): State<AppState>,
    Path(code): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Review>)> {
    let mut form = FormData::read(multipart).await?;
    let fields = ReviewForm::from_form(&form)?;
    let images = form.take_files("images");
    review_service::check_review_images(&images)?;

    let product = product_queries::find_active_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let review = review_service::submit_review(
        &state.db,
        state.storage.as_ref(),
        product.id,
        &fields,
        &images,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}
