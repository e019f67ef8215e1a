//! services/api/src/web/favorites.rs

use axum::{
    extract::{Path, State},
    Json,
};
use biblio_core::domain::{FavoriteBook, FavoriteEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::books::BookResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub user_id: Uuid,
    pub book_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteEntry> for FavoriteResponse {
    fn from(entry: FavoriteEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            book_id: entry.book_id,
            created_at: entry.created_at,
        }
    }
}

/// A favorite with its book resolved.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteBookResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book: BookResponse,
}

impl From<FavoriteBook> for FavoriteBookResponse {
    fn from(favorite: FavoriteBook) -> Self {
        Self {
            id: favorite.id,
            user_id: favorite.user_id,
            book: favorite.book.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /favorites - Favorite a book (idempotent per user and book)
#[utoipa::path(
    post,
    path = "/favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "The new or existing favorite", body = FavoriteResponse),
        (status = 404, description = "Unknown user or book")
    )
)]
pub async fn add_favorite_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let entry = state.db.add_favorite(req.user_id, req.book_id).await?;
    debug!(user_id = %req.user_id, book_id = %req.book_id, "Favorite stored");
    Ok(Json(entry.into()))
}

/// GET /favorites/{user_id} - A reader's favorites with books resolved
#[utoipa::path(
    get,
    path = "/favorites/{user_id}",
    params(("user_id" = Uuid, Path, description = "Reader id")),
    responses((status = 200, description = "Favorites", body = [FavoriteBookResponse]))
)]
pub async fn list_favorites_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<FavoriteBookResponse>>, ApiError> {
    let favorites = state.db.list_favorites(user_id).await?;
    Ok(Json(favorites.into_iter().map(FavoriteBookResponse::from).collect()))
}

/// DELETE /favorites - Unfavorite a book
#[utoipa::path(
    delete,
    path = "/favorites",
    request_body = FavoriteRequest,
    responses((status = 200, description = "Removed (or was never there)", body = SuccessResponse))
)]
pub async fn remove_favorite_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let removed = state.db.remove_favorite(req.user_id, req.book_id).await?;
    debug!(user_id = %req.user_id, book_id = %req.book_id, removed, "Favorite removed");
    Ok(Json(SuccessResponse { success: true }))
}
