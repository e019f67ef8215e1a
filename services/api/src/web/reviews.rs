//! services/api/src/web/reviews.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use biblio_core::domain::{NewReview, Review};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub date: NaiveDate,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            book_id: review.book_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            date: review.date,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    /// Defaults to today when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    /// Only return reviews of this book.
    pub book_id: Option<Uuid>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /reviews - List reviews, optionally for one book
#[utoipa::path(
    get,
    path = "/reviews",
    params(ReviewQuery),
    responses((status = 200, description = "Reviews", body = [ReviewResponse]))
)]
pub async fn list_reviews_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = state.db.list_reviews(query.book_id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// POST /reviews - Leave a star rating
#[utoipa::path(
    post,
    path = "/reviews",
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 404, description = "Unknown user or book")
    )
)]
pub async fn create_review_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = NewReview {
        book_id: req.book_id,
        user_id: req.user_id,
        rating: req.rating,
        comment: req.comment,
        date: req.date.unwrap_or_else(|| Utc::now().date_naive()),
    };
    review.validate()?;
    let review = state.db.create_review(review).await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}
