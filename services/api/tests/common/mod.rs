//! In-memory `DatabaseService` and request helpers for router tests.

use std::collections::HashMap;
use std::sync::Arc;

use api_lib::web::{router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use biblio_core::domain::{
    Book, FavoriteBook, FavoriteEntry, NewBook, NewReview, Review, User, UserCredentials,
};
use biblio_core::ports::{DatabaseService, PortError, PortResult};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<(UserCredentials, Vec<Uuid>)>,
    books: Vec<Book>,
    reviews: Vec<Review>,
    favorites: Vec<FavoriteEntry>,
}

/// Mirrors the Postgres schema's constraints: unique emails, unique
/// favorites per pair, and references that must resolve.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

impl Tables {
    fn user(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .iter()
            .find(|(c, _)| c.user_id == user_id)
            .map(|(c, read)| User {
                id: c.user_id,
                email: c.email.clone(),
                books_read: read.clone(),
            })
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }

    fn require_refs(&self, user_id: Uuid, book_id: Uuid) -> PortResult<()> {
        self.user(user_id)?;
        if !self.books.iter().any(|b| b.id == book_id) {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut t = self.tables.lock();
        if t.users.iter().any(|(c, _)| c.email == email) {
            return Err(PortError::Conflict("Email already exists".to_string()));
        }
        let creds = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        let id = creds.user_id;
        t.users.push((creds, Vec::new()));
        t.user(id)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.tables
            .lock()
            .users
            .iter()
            .find(|(c, _)| c.email == email)
            .map(|(c, _)| c.clone())
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.tables.lock().user(user_id)
    }

    async fn add_book_read(&self, user_id: Uuid, book_id: Uuid) -> PortResult<User> {
        let mut t = self.tables.lock();
        t.require_refs(user_id, book_id)?;
        if let Some((_, read)) = t.users.iter_mut().find(|(c, _)| c.user_id == user_id) {
            if !read.contains(&book_id) {
                read.push(book_id);
            }
        }
        t.user(user_id)
    }

    async fn list_books(&self) -> PortResult<Vec<Book>> {
        Ok(self.tables.lock().books.clone())
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book> {
        self.tables
            .lock()
            .books
            .iter()
            .find(|b| b.id == book_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))
    }

    async fn create_book(&self, book: NewBook) -> PortResult<Book> {
        let book = Book {
            id: Uuid::new_v4(),
            title: book.title,
            author: book.author,
            genre: book.genre,
            description: book.description,
            cover: book.cover,
            content: book.content,
            created_at: Utc::now(),
        };
        self.tables.lock().books.push(book.clone());
        Ok(book)
    }

    async fn update_book(&self, book_id: Uuid, update: NewBook) -> PortResult<Book> {
        let mut t = self.tables.lock();
        let book = t
            .books
            .iter_mut()
            .find(|b| b.id == book_id)
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))?;
        book.title = update.title;
        book.author = update.author;
        book.genre = update.genre;
        book.description = update.description;
        book.cover = update.cover;
        book.content = update.content;
        Ok(book.clone())
    }

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()> {
        let mut t = self.tables.lock();
        let before = t.books.len();
        t.books.retain(|b| b.id != book_id);
        if t.books.len() == before {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        t.favorites.retain(|f| f.book_id != book_id);
        t.reviews.retain(|r| r.book_id != book_id);
        Ok(())
    }

    async fn list_reviews(&self, book_id: Option<Uuid>) -> PortResult<Vec<Review>> {
        Ok(self
            .tables
            .lock()
            .reviews
            .iter()
            .filter(|r| book_id.map_or(true, |id| r.book_id == id))
            .cloned()
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> PortResult<Review> {
        let mut t = self.tables.lock();
        t.require_refs(review.user_id, review.book_id)?;
        let review = Review {
            id: Uuid::new_v4(),
            book_id: review.book_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            date: review.date,
        };
        t.reviews.push(review.clone());
        Ok(review)
    }

    async fn add_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<FavoriteEntry> {
        let mut t = self.tables.lock();
        t.require_refs(user_id, book_id)?;
        if let Some(existing) = t
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.book_id == book_id)
        {
            return Ok(existing.clone());
        }
        let entry = FavoriteEntry {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            created_at: Utc::now(),
        };
        t.favorites.push(entry.clone());
        Ok(entry)
    }

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<FavoriteBook>> {
        let t = self.tables.lock();
        Ok(t.favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| {
                let book = t.books.iter().find(|b| b.id == f.book_id)?.clone();
                Some(FavoriteBook {
                    id: f.id,
                    user_id,
                    book,
                })
            })
            .collect())
    }

    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let mut t = self.tables.lock();
        let before = t.favorites.len();
        t.favorites
            .retain(|f| !(f.user_id == user_id && f.book_id == book_id));
        Ok(t.favorites.len() != before)
    }
}

pub fn app() -> Router {
    router(Arc::new(AppState::new(Arc::new(MemoryDb::default()))))
}

/// Sends one request through the router and returns status plus parsed JSON body.
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}
