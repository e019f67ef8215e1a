//! crates/biblio_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database; their serde form is the
//! camelCase JSON exchanged between the mobile client and the backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

/// Prefix of every key-value entry that stores a reading position.
pub const PIN_KEY_PREFIX: &str = "pin_";

/// Lowest and highest star rating a review may carry.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A book in the library. Immutable from the client's point of view once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

/// The writable fields of a book, used for admin create/update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
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

/// A star rating with an optional comment left by a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub date: NaiveDate,
}

impl NewReview {
    /// Builds a review dated today, rejecting ratings outside the star range.
    pub fn new(book_id: Uuid, user_id: Uuid, rating: u8, comment: Option<String>) -> PortResult<Self> {
        let review = Self {
            book_id,
            user_id,
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
            date: Utc::now().date_naive(),
        };
        review.validate()?;
        Ok(review)
    }

    pub fn validate(&self) -> PortResult<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(PortError::InvalidInput(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, self.rating
            )));
        }
        Ok(())
    }
}

/// Mean star rating of one book, or `None` when nobody has reviewed it.
pub fn average_rating(reviews: &[Review], book_id: Uuid) -> Option<f64> {
    let (sum, count) = reviews
        .iter()
        .filter(|r| r.book_id == book_id)
        .fold((0u32, 0u32), |(sum, count), r| (sum + r.rating as u32, count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// A (user, book) favorite pairing, unique per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A favorite entry with its book resolved, as returned by the favorites listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteBook {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book: Book,
}

/// The signed-in reader, as held by the client session and returned by auth routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub books_read: Vec<Uuid>,
}

impl User {
    /// Display name shown on the profile screen: the local part of the email.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A saved reading position for one book title on this device.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkRecord {
    pub book_title: String,
    pub scroll_offset: f64,
}

impl BookmarkRecord {
    pub fn key_for(title: &str) -> String {
        format!("{}{}", PIN_KEY_PREFIX, title)
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.book_title)
    }

    /// Recovers the book title from a storage key, if the key is a pin key.
    pub fn title_from_key(key: &str) -> Option<&str> {
        key.strip_prefix(PIN_KEY_PREFIX)
    }
}
