//! crates/biblio_client/src/http.rs
//!
//! The HTTP adapter for the Biblio backend. Implements the `FavoritesApi`,
//! `AuthApi` and `CatalogApi` ports on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use biblio_core::domain::{Book, FavoriteBook, FavoriteEntry, NewReview, Review, User};
use biblio_core::ports::{AuthApi, CatalogApi, FavoritesApi, PortError, PortResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// Wire Payloads
//=========================================================================================

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserBookPayload {
    user_id: Uuid,
    book_id: Uuid,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct SuccessReply {
    success: bool,
}

#[derive(Deserialize)]
struct MessageReply {
    message: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a backend rooted at `base_url`, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let status = response.status();
        debug!(%status, url = %response.url(), "Backend responded");

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| PortError::Unexpected(format!("malformed response: {}", e)));
        }

        let message = response
            .json::<MessageReply>()
            .await
            .map(|m| m.message)
            .unwrap_or_else(|_| status.to_string());
        Err(error_for_status(status, message))
    }
}

/// Maps a non-success HTTP status onto the port error taxonomy.
pub fn error_for_status(status: StatusCode, message: String) -> PortError {
    match status {
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        StatusCode::CONFLICT => PortError::Conflict(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PortError::InvalidInput(message)
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            PortError::Transport(message)
        }
        _ => PortError::Unexpected(format!("{}: {}", status, message)),
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl FavoritesApi for HttpBackend {
    async fn add_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<FavoriteEntry> {
        let body = UserBookPayload { user_id, book_id };
        self.send(self.client.post(self.url("/favorites")).json(&body))
            .await
    }

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<FavoriteBook>> {
        self.send(self.client.get(self.url(&format!("/favorites/{}", user_id))))
            .await
    }

    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let body = UserBookPayload { user_id, book_id };
        let reply: SuccessReply = self
            .send(self.client.delete(self.url("/favorites")).json(&body))
            .await?;
        Ok(reply.success)
    }
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn signup(&self, email: &str, password: &str) -> PortResult<User> {
        let body = Credentials { email, password };
        self.send(self.client.post(self.url("/signup")).json(&body))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<User> {
        let body = Credentials { email, password };
        self.send(self.client.post(self.url("/login")).json(&body))
            .await
    }

    async fn finish_book(&self, user_id: Uuid, book_id: Uuid) -> PortResult<User> {
        let body = UserBookPayload { user_id, book_id };
        let envelope: UserEnvelope = self
            .send(self.client.post(self.url("/users/finish-book")).json(&body))
            .await?;
        Ok(envelope.user)
    }
}

#[async_trait]
impl CatalogApi for HttpBackend {
    async fn list_books(&self) -> PortResult<Vec<Book>> {
        self.send(self.client.get(self.url("/books"))).await
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book> {
        self.send(self.client.get(self.url(&format!("/books/{}", book_id))))
            .await
    }

    async fn list_reviews(&self, book_id: Option<Uuid>) -> PortResult<Vec<Review>> {
        let mut request = self.client.get(self.url("/reviews"));
        if let Some(book_id) = book_id {
            request = request.query(&[("bookId", book_id.to_string())]);
        }
        self.send(request).await
    }

    async fn submit_review(&self, review: NewReview) -> PortResult<Review> {
        review.validate()?;
        self.send(self.client.post(self.url("/reviews")).json(&review))
            .await
    }
}
