//! crates/biblio_core/src/session.rs
//!
//! The signed-in reader's context: who is logged in, and the favorites that
//! belong to them. Screens borrow this object instead of reaching for global
//! state; dropping it (or logging out) ends the session.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Book, User};
use crate::favorites::FavoritesSynchronizer;
use crate::ports::{AuthApi, FavoritesApi, PortError, PortResult};

pub struct SessionContext {
    auth: Arc<dyn AuthApi>,
    user: Option<User>,
    favorites: FavoritesSynchronizer,
}

impl SessionContext {
    pub fn new(auth: Arc<dyn AuthApi>, favorites_api: Arc<dyn FavoritesApi>) -> Self {
        Self {
            auth,
            user: None,
            favorites: FavoritesSynchronizer::new(favorites_api),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn favorites(&self) -> &FavoritesSynchronizer {
        &self.favorites
    }

    /// Number of books the reader has marked as finished.
    pub fn completed_count(&self) -> usize {
        self.user.as_ref().map_or(0, |u| u.books_read.len())
    }

    /// Registers a new account and starts a session for it.
    pub async fn signup(&mut self, email: &str, password: &str) -> PortResult<&User> {
        let email = require_credentials(email, password)?;
        let user = self.auth.signup(email, password).await.map_err(|e| {
            warn!(%email, "Signup failed: {}", e);
            e
        })?;
        info!(user_id = %user.id, "Account created");
        Ok(self.activate(user).await)
    }

    /// Logs in with an existing account. On failure the session stays as it was.
    pub async fn login(&mut self, email: &str, password: &str) -> PortResult<&User> {
        let email = require_credentials(email, password)?;
        let user = self.auth.login(email, password).await.map_err(|e| {
            warn!(%email, "Login failed: {}", e);
            e
        })?;
        info!(user_id = %user.id, "Logged in");
        Ok(self.activate(user).await)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "Logged out");
        }
        self.favorites.set_user(None);
    }

    /// Records `book_id` as finished and adopts the server's copy of the user.
    pub async fn mark_as_finished(&mut self, book_id: Uuid) -> PortResult<&User> {
        let user_id = self
            .user
            .as_ref()
            .map(|u| u.id)
            .ok_or_else(|| PortError::Unauthorized("no active user".to_string()))?;
        let updated = self.auth.finish_book(user_id, book_id).await.map_err(|e| {
            warn!(%user_id, %book_id, "Failed to mark book as finished: {}", e);
            e
        })?;
        Ok(self.user.insert(updated))
    }

    /// Flips the favorite state of `book` and waits for the server.
    pub async fn toggle_favorite(&self, book: Book) -> PortResult<bool> {
        if self.favorites.contains(book.id) {
            self.favorites.remove(book.id).await?;
            Ok(false)
        } else {
            self.favorites.add(book).await?;
            Ok(true)
        }
    }

    async fn activate(&mut self, user: User) -> &User {
        self.favorites.set_user(Some(user.id));
        // Background reconciliation; a failure leaves the list empty.
        let _ = self.favorites.reload(user.id).await;
        self.user.insert(user)
    }
}

fn require_credentials<'a>(email: &'a str, password: &str) -> PortResult<&'a str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(PortError::InvalidInput(
            "Enter email and password".to_string(),
        ));
    }
    Ok(email)
}
