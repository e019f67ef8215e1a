//! services/api/src/web/books.rs
//!
//! Library endpoints. Reads are what the mobile client uses; create, update
//! and delete are admin operations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use biblio_core::domain::{Book, NewBook};
use biblio_core::ports::PortError;
use chrono::{DateTime, Utc};
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

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub cover: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            description: book.description,
            cover: book.cover,
            content: book.content,
            created_at: book.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl BookRequest {
    fn into_domain(self) -> Result<NewBook, ApiError> {
        if self.title.trim().is_empty() {
            return Err(PortError::InvalidInput("title is required".to_string()).into());
        }
        Ok(NewBook {
            title: self.title,
            author: self.author,
            genre: self.genre,
            description: self.description,
            cover: self.cover,
            content: self.content,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /books - List the whole library
#[utoipa::path(
    get,
    path = "/books",
    responses((status = 200, description = "All books", body = [BookResponse]))
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = state.db.list_books().await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/{id} - Fetch one book with its full text
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "No such book")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    Ok(Json(state.db.get_book(id).await?.into()))
}

/// POST /books - Add a book to the library
#[utoipa::path(
    post,
    path = "/books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Missing title")
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state.db.create_book(req.into_domain()?).await?;
    info!(book_id = %book.id, title = %book.title, "Book created");
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// PUT /books/{id} - Replace a book's fields
#[utoipa::path(
    put,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 404, description = "No such book")
    )
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.db.update_book(id, req.into_domain()?).await?;
    Ok(Json(book.into()))
}

/// DELETE /books/{id} - Remove a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "No such book")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.delete_book(id).await?;
    info!(book_id = %id, "Book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}
