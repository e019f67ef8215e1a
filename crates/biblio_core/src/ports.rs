//! crates/biblio_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the key-value
//! store on the device, the HTTP backend, or the server's database.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Book, FavoriteBook, FavoriteEntry, NewBook, NewReview, Review, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Local storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Client-side Ports (Traits)
//=========================================================================================

/// Device-local string key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;

    async fn list_keys(&self) -> PortResult<Vec<String>>;
}

/// The remote favorites collaborator.
#[async_trait]
pub trait FavoritesApi: Send + Sync {
    /// Creates the favorite, or returns the existing entry for the pair.
    async fn add_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<FavoriteEntry>;

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<FavoriteBook>>;

    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool>;
}

/// The remote authentication and profile collaborator.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn signup(&self, email: &str, password: &str) -> PortResult<User>;

    async fn login(&self, email: &str, password: &str) -> PortResult<User>;

    /// Records `book_id` as finished and returns the updated user.
    async fn finish_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<User>;
}

/// The remote books and reviews collaborator.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_books(&self) -> PortResult<Vec<Book>>;

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book>;

    async fn list_reviews(&self, book_id: Option<Uuid>) -> PortResult<Vec<Review>>;

    async fn submit_review(&self, review: NewReview) -> PortResult<Review>;
}

//=========================================================================================
// Server-side Port
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    /// Adds `book_id` to the user's finished books (set semantics).
    async fn add_book_read(&self, user_id: Uuid, book_id: Uuid) -> PortResult<User>;

    // --- Books ---
    async fn list_books(&self) -> PortResult<Vec<Book>>;

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book>;

    async fn create_book(&self, book: NewBook) -> PortResult<Book>;

    async fn update_book(&self, book_id: Uuid, book: NewBook) -> PortResult<Book>;

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()>;

    // --- Reviews ---
    async fn list_reviews(&self, book_id: Option<Uuid>) -> PortResult<Vec<Review>>;

    async fn create_review(&self, review: NewReview) -> PortResult<Review>;

    // --- Favorites ---
    /// Inserts the pair or returns the entry that already exists for it.
    async fn add_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<FavoriteEntry>;

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<FavoriteBook>>;

    /// Returns whether an entry was actually removed.
    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool>;
}
