//! services/api/src/web/users.rs
//!
//! Reader profile endpoints.

use axum::{extract::State, Json};
use biblio_core::domain::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// The public view of an account.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub books_read: Vec<Uuid>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            books_read: user.books_read,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishBookRequest {
    pub user_id: Uuid,
    pub book_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct FinishBookResponse {
    pub user: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /users/finish-book - Mark a book as finished for a reader
#[utoipa::path(
    post,
    path = "/users/finish-book",
    request_body = FinishBookRequest,
    responses(
        (status = 200, description = "Updated reader profile", body = FinishBookResponse),
        (status = 404, description = "Unknown user or book"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn finish_book_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FinishBookRequest>,
) -> Result<Json<FinishBookResponse>, ApiError> {
    let user = state.db.add_book_read(req.user_id, req.book_id).await?;
    info!(user_id = %user.id, book_id = %req.book_id, "Book marked as finished");
    Ok(Json(FinishBookResponse { user: user.into() }))
}
