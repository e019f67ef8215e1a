//! Shared fakes for the core's unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::domain::{Book, FavoriteBook, FavoriteEntry, User};
use crate::ports::{AuthApi, FavoritesApi, KeyValueStore, PortError, PortResult};

pub fn book(title: &str) -> Book {
    Book {
        id: Uuid::new_v4(),
        title: title.to_string(),
        author: "Anon".to_string(),
        genre: "Fiction".to_string(),
        description: String::new(),
        cover: None,
        content: format!("The text of {}.", title),
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<BTreeMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> PortResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> PortResult<Option<String>> {
        Err(PortError::Storage("disk unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> PortResult<()> {
        Err(PortError::Storage("disk unavailable".into()))
    }

    async fn remove(&self, _key: &str) -> PortResult<()> {
        Err(PortError::Storage("disk unavailable".into()))
    }

    async fn list_keys(&self) -> PortResult<Vec<String>> {
        Err(PortError::Storage("disk unavailable".into()))
    }
}

/// In-memory favorites backend. Book ids without a seeded book are kept but
/// not returned by `list_favorites`, like the server's join.
#[derive(Default)]
pub struct MockFavoritesApi {
    catalog: Mutex<HashMap<Uuid, Book>>,
    favorites: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub fail_add: AtomicBool,
    pub fail_remove: AtomicBool,
    pub fail_list: AtomicBool,
}

impl MockFavoritesApi {
    pub fn seed(&self, user_id: Uuid, books: Vec<Book>) {
        let ids = books.iter().map(|b| b.id).collect();
        let mut catalog = self.catalog.lock();
        for book in books {
            catalog.insert(book.id, book);
        }
        self.favorites.lock().insert(user_id, ids);
    }

    pub fn remote_ids(&self, user_id: Uuid) -> Vec<Uuid> {
        self.favorites.lock().get(&user_id).cloned().unwrap_or_default()
    }

    /// Makes the next `list_favorites` wait until the returned handle is notified.
    pub fn hold_list(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }
}

#[async_trait]
impl FavoritesApi for MockFavoritesApi {
    async fn add_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<FavoriteEntry> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(PortError::Transport("connection reset".into()));
        }
        let mut favorites = self.favorites.lock();
        let ids = favorites.entry(user_id).or_default();
        if !ids.contains(&book_id) {
            ids.push(book_id);
        }
        Ok(FavoriteEntry {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            created_at: Utc::now(),
        })
    }

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<FavoriteBook>> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(PortError::Transport("connection refused".into()));
        }
        let catalog = self.catalog.lock();
        Ok(self
            .remote_ids(user_id)
            .into_iter()
            .filter_map(|id| catalog.get(&id).cloned())
            .map(|book| FavoriteBook {
                id: Uuid::new_v4(),
                user_id,
                book,
            })
            .collect())
    }

    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(PortError::Transport("timed out".into()));
        }
        let mut favorites = self.favorites.lock();
        let ids = favorites.entry(user_id).or_default();
        let before = ids.len();
        ids.retain(|id| *id != book_id);
        Ok(ids.len() != before)
    }
}

/// Auth backend with a fixed set of registered accounts (plain-text passwords).
#[derive(Default)]
pub struct MockAuthApi {
    accounts: Mutex<HashMap<String, (String, User)>>,
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn signup(&self, email: &str, password: &str) -> PortResult<User> {
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(email) {
            return Err(PortError::Conflict("Email already exists".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            books_read: Vec::new(),
        };
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<User> {
        let accounts = self.accounts.lock();
        let (stored, user) = accounts
            .get(email)
            .ok_or_else(|| PortError::NotFound("User not found".into()))?;
        if stored != password {
            return Err(PortError::Unauthorized("Invalid credentials".into()));
        }
        Ok(user.clone())
    }

    async fn finish_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<User> {
        let mut accounts = self.accounts.lock();
        let (_, user) = accounts
            .values_mut()
            .find(|(_, u)| u.id == user_id)
            .ok_or_else(|| PortError::NotFound("User not found".into()))?;
        if !user.books_read.contains(&book_id) {
            user.books_read.push(book_id);
        }
        Ok(user.clone())
    }
}
