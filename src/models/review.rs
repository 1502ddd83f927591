use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::{
    error::{AppError, Result},
    services::storage_service::public_url,
    utils::multipart::FormData,
};

// DB models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Moderation never moves a review back to pending.
    pub fn can_transition_to(self, next: ReviewStatus) -> bool {
        matches!(
            (self, next),
            (ReviewStatus::Pending, ReviewStatus::Approved)
                | (ReviewStatus::Pending, ReviewStatus::Rejected)
                | (ReviewStatus::Rejected, ReviewStatus::Approved)
                | (ReviewStatus::Approved, ReviewStatus::Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i32,
    pub product_id: i32,
    pub customer_name: String,
    pub rating: i32,
    pub comment: String,
    pub review_images: Json<Vec<String>>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewWithProduct {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub product_name: Option<String>,
}

// Request types

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewFilter {
    #[default]
    All,
    Approved,
    Pending,
    Rejected,
}

impl ReviewFilter {
    pub fn status(self) -> Option<ReviewStatus> {
        match self {
            ReviewFilter::All => None,
            ReviewFilter::Approved => Some(ReviewStatus::Approved),
            ReviewFilter::Pending => Some(ReviewStatus::Pending),
            ReviewFilter::Rejected => Some(ReviewStatus::Rejected),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    #[serde(default)]
    pub status: ReviewFilter,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewStatusRequest {
    pub status: ReviewStatus,
}

const DEFAULT_RATING: i32 = 5;

/// Validated text part of the public review form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewForm {
    pub customer_name: String,
    pub rating: i32,
    pub comment: String,
}

impl ReviewForm {
    pub fn from_form(form: &FormData) -> Result<Self> {
        let (Some(customer_name), Some(comment)) =
            (form.text("customer_name"), form.text("comment"))
        else {
            return Err(AppError::BadRequest(
                "Name and comment are required".to_string(),
            ));
        };

        let rating = match form.text("rating") {
            Some(raw) => raw
                .parse::<i32>()
                .map_err(|_| AppError::BadRequest("Rating must be a number".to_string()))?,
            None => DEFAULT_RATING,
        };

        if !(1..=5).contains(&rating) {
            return Err(AppError::BadRequest(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        Ok(Self {
            customer_name: customer_name.to_string(),
            rating,
            comment: comment.to_string(),
        })
    }
}

// Response types

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewCounts {
    pub all: i64,
    pub approved: i64,
    pub pending: i64,
    pub rejected: i64,
}

impl ReviewCounts {
    pub fn from_grouped(rows: &[(ReviewStatus, i64)]) -> Self {
        rows.iter()
            .fold(ReviewCounts::default(), |mut counts, (status, count)| {
                counts.all += count;
                match status {
                    ReviewStatus::Approved => counts.approved += count,
                    ReviewStatus::Pending => counts.pending += count,
                    ReviewStatus::Rejected => counts.rejected += count,
                }
                counts
            })
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewWithProduct>,
    pub counts: ReviewCounts,
}

/// Review as shown to the public, photos resolved to URLs.
#[derive(Debug, Serialize)]
pub struct PublicReview {
    pub id: i32,
    pub customer_name: String,
    pub rating: i32,
    pub comment: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl PublicReview {
    pub fn new(review: Review, assets_url: &str) -> Self {
        Self {
            id: review.id,
            images: review
                .review_images
                .0
                .iter()
                .map(|path| public_url(assets_url, path))
                .collect(),
            customer_name: review.customer_name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

/// Arithmetic mean of the ratings, `0.0` when there are none.
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64
}

#[derive(Debug, Serialize)]
pub struct ReviewSummary {
    pub average_rating: f64,
    pub review_count: usize,
    pub reviews: Vec<PublicReview>,
}

impl ReviewSummary {
    pub fn from_approved(reviews: Vec<Review>, assets_url: &str) -> Self {
        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();

        Self {
            average_rating: average_rating(&ratings),
            review_count: reviews.len(),
            reviews: reviews
                .into_iter()
                .map(|review| PublicReview::new(review, assets_url))
                .collect(),
        }
    }
}
