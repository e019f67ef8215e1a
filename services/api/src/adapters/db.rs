//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use biblio_core::domain::{
    Book, FavoriteBook, FavoriteEntry, NewBook, NewReview, Review, User, UserCredentials,
};
use biblio_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Translates a `sqlx` failure into the port taxonomy. `what` names the
/// entity the statement was about, for the not-found and conflict messages.
pub fn map_db_error(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", what))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::NotFound(format!("{} refers to a missing user or book", what))
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            PortError::InvalidInput(format!("{} violates a constraint", what))
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const BOOK_COLUMNS: &str = "id, title, author, genre, description, cover, content, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    books_read: Vec<Uuid>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            books_read: self.books_read,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: String,
    genre: String,
    description: String,
    cover: Option<String>,
    content: String,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            description: self.description,
            cover: self.cover,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    book_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: Option<String>,
    review_date: NaiveDate,
}
impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            book_id: self.book_id,
            user_id: self.user_id,
            rating: self.rating.clamp(0, u8::MAX as i16) as u8,
            comment: self.comment,
            date: self.review_date,
        }
    }
}

#[derive(FromRow)]
struct FavoriteRecord {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    created_at: DateTime<Utc>,
}
impl FavoriteRecord {
    fn to_domain(self) -> FavoriteEntry {
        FavoriteEntry {
            id: self.id,
            user_id: self.user_id,
            book_id: self.book_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct FavoriteBookRecord {
    favorite_id: Uuid,
    user_id: Uuid,
    #[sqlx(flatten)]
    book: BookRecord,
}
impl FavoriteBookRecord {
    fn to_domain(self) -> FavoriteBook {
        FavoriteBook {
            id: self.favorite_id,
            user_id: self.user_id,
            book: self.book.to_domain(),
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "INSERT INTO users (id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING id, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e, "User") {
            PortError::Conflict(_) => PortError::Conflict("Email already exists".to_string()),
            other => other,
        })?;

        Ok(User {
            id: record.id,
            email: record.email,
            books_read: Vec::new(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "User"))?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.email, \
                    COALESCE(array_agg(r.book_id ORDER BY r.finished_at) \
                             FILTER (WHERE r.book_id IS NOT NULL), '{}') AS books_read \
             FROM users u LEFT JOIN books_read r ON r.user_id = u.id \
             WHERE u.id = $1 GROUP BY u.id",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "User"))?;
        Ok(record.to_domain())
    }

    async fn add_book_read(&self, user_id: Uuid, book_id: Uuid) -> PortResult<User> {
        // Surface an unknown user as such before the insert trips the foreign key.
        self.get_user(user_id).await?;

        sqlx::query(
            "INSERT INTO books_read (user_id, book_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, book_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Book"))?;

        self.get_user(user_id).await
    }

    async fn list_books(&self) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books ORDER BY created_at ASC",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Book"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Book"))?;
        Ok(record.to_domain())
    }

    async fn create_book(&self, book: NewBook) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "INSERT INTO books (id, title, author, genre, description, cover, content) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(book.title)
        .bind(book.author)
        .bind(book.genre)
        .bind(book.description)
        .bind(book.cover)
        .bind(book.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Book"))?;
        Ok(record.to_domain())
    }

    async fn update_book(&self, book_id: Uuid, book: NewBook) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "UPDATE books SET title = $2, author = $3, genre = $4, description = $5, \
             cover = $6, content = $7 WHERE id = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(book_id)
        .bind(book.title)
        .bind(book.author)
        .bind(book.genre)
        .bind(book.description)
        .bind(book.cover)
        .bind(book.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Book"))?;
        Ok(record.to_domain())
    }

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Book"))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        Ok(())
    }

    async fn list_reviews(&self, book_id: Option<Uuid>) -> PortResult<Vec<Review>> {
        let records = sqlx::query_as::<_, ReviewRecord>(
            "SELECT id, book_id, user_id, rating, comment, review_date FROM reviews \
             WHERE $1::uuid IS NULL OR book_id = $1 ORDER BY created_at ASC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Review"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_review(&self, review: NewReview) -> PortResult<Review> {
        review.validate()?;
        let record = sqlx::query_as::<_, ReviewRecord>(
            "INSERT INTO reviews (id, book_id, user_id, rating, comment, review_date) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, book_id, user_id, rating, comment, review_date",
        )
        .bind(Uuid::new_v4())
        .bind(review.book_id)
        .bind(review.user_id)
        .bind(review.rating as i16)
        .bind(review.comment)
        .bind(review.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Review"))?;
        Ok(record.to_domain())
    }

    async fn add_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<FavoriteEntry> {
        // The no-op update makes RETURNING yield the existing row on conflict,
        // so concurrent adds for the same pair converge on one entry.
        let record = sqlx::query_as::<_, FavoriteRecord>(
            "INSERT INTO favorites (id, user_id, book_id) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, book_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING id, user_id, book_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Favorite"))?;
        Ok(record.to_domain())
    }

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<FavoriteBook>> {
        let records = sqlx::query_as::<_, FavoriteBookRecord>(
            "SELECT f.id AS favorite_id, f.user_id, \
                    b.id, b.title, b.author, b.genre, b.description, b.cover, b.content, b.created_at \
             FROM favorites f JOIN books b ON b.id = f.book_id \
             WHERE f.user_id = $1 ORDER BY f.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Favorite"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Favorite"))?;
        Ok(result.rows_affected() > 0)
    }
}
