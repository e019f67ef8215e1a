pub mod auth;
pub mod books;
pub mod favorites;
pub mod rest;
pub mod reviews;
pub mod state;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Builds the API router. CORS and the Swagger UI are layered on by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(rest::health_handler))
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/users/finish-book", post(users::finish_book_handler))
        .route(
            "/books",
            get(books::list_books_handler).post(books::create_book_handler),
        )
        .route(
            "/books/{id}",
            get(books::get_book_handler)
                .put(books::update_book_handler)
                .delete(books::delete_book_handler),
        )
        .route(
            "/reviews",
            get(reviews::list_reviews_handler).post(reviews::create_review_handler),
        )
        .route(
            "/favorites",
            post(favorites::add_favorite_handler).delete(favorites::remove_favorite_handler),
        )
        .route("/favorites/{user_id}", get(favorites::list_favorites_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
