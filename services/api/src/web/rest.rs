//! services/api/src/web/rest.rs
//!
//! Contains the health endpoint and the master definition for the OpenAPI
//! specification.

use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, books, favorites, reviews, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        users::finish_book_handler,
        books::list_books_handler,
        books::get_book_handler,
        books::create_book_handler,
        books::update_book_handler,
        books::delete_book_handler,
        reviews::list_reviews_handler,
        reviews::create_review_handler,
        favorites::add_favorite_handler,
        favorites::list_favorites_handler,
        favorites::remove_favorite_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            users::UserResponse,
            users::FinishBookRequest,
            users::FinishBookResponse,
            books::BookResponse,
            books::BookRequest,
            books::MessageResponse,
            reviews::ReviewResponse,
            reviews::ReviewRequest,
            favorites::FavoriteRequest,
            favorites::FavoriteResponse,
            favorites::FavoriteBookResponse,
            favorites::SuccessResponse,
        )
    ),
    tags(
        (name = "Biblio API", description = "Books, reviews, favorites and accounts for the Biblio reader.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
