//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup and login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use biblio_core::domain::User;
use biblio_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub id: Uuid,
    pub email: String,
    pub books_read: Vec<Uuid>,
}

impl AuthResponse {
    fn new(message: &str, user: User) -> Self {
        Self {
            message: message.to_string(),
            id: user.id,
            email: user.email,
            books_read: user.books_read,
        }
    }
}

fn require_credentials(email: &str, password: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(PortError::InvalidInput("Enter email and password".to_string()).into());
    }
    Ok(email.to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /signup - Create a new user account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Email already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = require_credentials(&req.email, &req.password)?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create user in database; a taken email surfaces as a conflict
    let user = state.db.create_user_with_email(&email, &password_hash).await?;
    info!(user_id = %user.id, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new("User created successfully", user)),
    ))
}

/// POST /login - Login with existing account
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = require_credentials(&req.email, &req.password)?;

    // 1. Get user by email
    let user_creds = state.db.get_user_by_email(&email).await.map_err(|e| match e {
        PortError::NotFound(_) => PortError::NotFound("User not found".to_string()),
        other => other,
    })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err(PortError::Unauthorized("Invalid credentials".to_string()).into());
    }

    // 3. Load the profile with finished books
    let user = state.db.get_user(user_creds.user_id).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse::new("Login successful", user)))
}
