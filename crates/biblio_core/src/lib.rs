pub mod bookmarks;
pub mod domain;
pub mod favorites;
pub mod ports;
pub mod session;

#[cfg(test)]
mod test_support;

pub use bookmarks::{ControlAction, Highlight, PinMode, ReaderTheme, ReadingPositionStore, ReadingSession};
pub use domain::{
    average_rating, Book, BookmarkRecord, FavoriteBook, FavoriteEntry, NewBook, NewReview, Review,
    User, UserCredentials,
};
pub use favorites::{FavoritesSynchronizer, PendingSync};
pub use ports::{
    AuthApi, CatalogApi, DatabaseService, FavoritesApi, KeyValueStore, PortError, PortResult,
};
pub use session::SessionContext;
