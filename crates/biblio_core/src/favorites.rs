//! crates/biblio_core/src/favorites.rs
//!
//! Keeps the signed-in reader's favorites list in memory and mirrors it to
//! the remote favorites collaborator.
//!
//! Mutations are optimistic: `add` and `remove` update the local list before
//! returning, then hand back a future that performs the remote call. Each
//! mutation is registered as a pending operation carrying a version number;
//! when the remote call settles the operation is confirmed, or rolled back if
//! it failed and no newer mutation for the same book has replaced it.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::Book;
use crate::ports::{FavoritesApi, PortError, PortResult};

/// The remote half of an optimistic mutation. Nothing is sent until it is
/// polled, so spawn it (or await it) to actually reach the server.
pub type PendingSync = BoxFuture<'static, PortResult<()>>;

#[derive(Debug, Clone)]
enum PendingKind {
    Add { book: Book, was_present: bool },
    Remove { removed: Option<(usize, Book)> },
}

#[derive(Debug, Clone)]
struct PendingOp {
    version: u64,
    kind: PendingKind,
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    user_id: Uuid,
    book_id: Uuid,
    epoch: u64,
    version: u64,
}

#[derive(Debug, Default)]
struct FavoritesState {
    user_id: Option<Uuid>,
    /// Bumped on every identity change; results from an older epoch are dropped.
    epoch: u64,
    next_version: u64,
    books: Vec<Book>,
    pending: HashMap<Uuid, PendingOp>,
}

impl FavoritesState {
    fn position(&self, book_id: Uuid) -> Option<usize> {
        self.books.iter().position(|b| b.id == book_id)
    }

    fn register(&mut self, book_id: Uuid, kind: PendingKind) -> u64 {
        self.next_version += 1;
        let version = self.next_version;
        self.pending.insert(book_id, PendingOp { version, kind });
        version
    }

    /// Re-applies a pending mutation on top of a freshly loaded list, recording
    /// what the list held so a later rollback restores the server's view.
    fn reapply(&mut self, book_id: Uuid, kind: &mut PendingKind) {
        match kind {
            PendingKind::Add { book, was_present } => {
                *was_present = self.position(book_id).is_some();
                if !*was_present {
                    self.books.push(book.clone());
                }
            }
            PendingKind::Remove { removed } => {
                *removed = self
                    .position(book_id)
                    .map(|index| (index, self.books.remove(index)));
            }
        }
    }

    fn rollback(&mut self, book_id: Uuid, kind: PendingKind) {
        match kind {
            PendingKind::Add { was_present, .. } => {
                if !was_present {
                    self.books.retain(|b| b.id != book_id);
                }
            }
            PendingKind::Remove { removed } => {
                if let Some((index, book)) = removed {
                    if self.position(book_id).is_none() {
                        let index = index.min(self.books.len());
                        self.books.insert(index, book);
                    }
                }
            }
        }
    }
}

/// Best-effort local mirror of one user's favorites.
#[derive(Clone)]
pub struct FavoritesSynchronizer {
    api: Arc<dyn FavoritesApi>,
    state: Arc<Mutex<FavoritesState>>,
}

impl FavoritesSynchronizer {
    pub fn new(api: Arc<dyn FavoritesApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(FavoritesState::default())),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.state.lock().user_id
    }

    /// Snapshot of the local favorites, in insertion order.
    pub fn books(&self) -> Vec<Book> {
        self.state.lock().books.clone()
    }

    pub fn contains(&self, book_id: Uuid) -> bool {
        self.state.lock().position(book_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of mutations whose remote call has not settled yet.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Switches the active identity. Any change empties the list and drops
    /// pending operations; returns whether the identity actually changed.
    pub fn set_user(&self, user_id: Option<Uuid>) -> bool {
        let mut state = self.state.lock();
        if state.user_id == user_id {
            return false;
        }
        state.user_id = user_id;
        state.epoch += 1;
        state.books.clear();
        state.pending.clear();
        true
    }

    /// Replaces the local list with the server's favorites for `user_id`.
    ///
    /// On failure the previous list is left untouched. A response that arrives
    /// after the active user changed is discarded; mutations still in flight
    /// are re-applied on top of the fresh list.
    pub async fn reload(&self, user_id: Uuid) -> PortResult<()> {
        let epoch = self.state.lock().epoch;

        let favorites = match self.api.list_favorites(user_id).await {
            Ok(favorites) => favorites,
            Err(e) => {
                warn!(%user_id, "Failed to load favorites: {}", e);
                return Err(e);
            }
        };

        let mut state = self.state.lock();
        if state.epoch != epoch || state.user_id != Some(user_id) {
            debug!(%user_id, "Discarding favorites for an inactive user");
            return Ok(());
        }

        state.books.clear();
        for favorite in favorites {
            if state.position(favorite.book.id).is_none() {
                state.books.push(favorite.book);
            }
        }

        let mut pending: Vec<(Uuid, PendingOp)> = state
            .pending
            .iter()
            .map(|(id, op)| (*id, op.clone()))
            .collect();
        pending.sort_by_key(|(_, op)| op.version);
        for (book_id, mut op) in pending {
            state.reapply(book_id, &mut op.kind);
            state.pending.insert(book_id, op);
        }

        info!(%user_id, count = state.books.len(), "Favorites reloaded");
        Ok(())
    }

    /// Adds `book` locally (no duplicates) and returns the remote write.
    pub fn add(&self, book: Book) -> PendingSync {
        let ticket = {
            let mut state = self.state.lock();
            let Some(user_id) = state.user_id else {
                return Box::pin(async { Err(no_user()) });
            };
            let was_present = state.position(book.id).is_some();
            if !was_present {
                state.books.push(book.clone());
            }
            let book_id = book.id;
            let version = state.register(book_id, PendingKind::Add { book, was_present });
            Ticket {
                user_id,
                book_id,
                epoch: state.epoch,
                version,
            }
        };

        let this = self.clone();
        Box::pin(async move {
            let result = this
                .api
                .add_favorite(ticket.user_id, ticket.book_id)
                .await
                .map(|_| ());
            this.settle(ticket, &result);
            result
        })
    }

    /// Removes `book_id` locally and returns the remote delete.
    pub fn remove(&self, book_id: Uuid) -> PendingSync {
        let ticket = {
            let mut state = self.state.lock();
            let Some(user_id) = state.user_id else {
                return Box::pin(async { Err(no_user()) });
            };
            let removed = state
                .position(book_id)
                .map(|index| (index, state.books.remove(index)));
            let version = state.register(book_id, PendingKind::Remove { removed });
            Ticket {
                user_id,
                book_id,
                epoch: state.epoch,
                version,
            }
        };

        let this = self.clone();
        Box::pin(async move {
            let result = this
                .api
                .remove_favorite(ticket.user_id, ticket.book_id)
                .await
                .map(|_| ());
            this.settle(ticket, &result);
            result
        })
    }

    fn settle(&self, ticket: Ticket, result: &PortResult<()>) {
        let mut state = self.state.lock();
        if state.epoch != ticket.epoch {
            return;
        }
        let current = state
            .pending
            .get(&ticket.book_id)
            .is_some_and(|op| op.version == ticket.version);
        if !current {
            if let Err(e) = result {
                warn!(book_id = %ticket.book_id, "Superseded favorite update failed: {}", e);
            }
            return;
        }
        let Some(op) = state.pending.remove(&ticket.book_id) else {
            return;
        };
        if let Err(e) = result {
            warn!(book_id = %ticket.book_id, "Favorite update failed, rolling back: {}", e);
            state.rollback(ticket.book_id, op.kind);
        }
    }
}

fn no_user() -> PortError {
    PortError::Unauthorized("no active user".to_string())
}
