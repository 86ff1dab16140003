/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Create an account and get a token
/// - `POST /api/v1/auth/login` - Exchange credentials for a token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tasknest_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, Role, User},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Accepts the username or the account email
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

/// Registers a new account.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Username or email already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TokenResponse>>)> {
    req.validate()?;

    // Check both identifiers up front for a clear conflict message;
    // the unique constraints still catch races
    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: Role::User,
        },
    )
    .await?;

    let ttl = state.config.token_ttl();
    let access_token = jwt::issue_token(user.id, ttl, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            TokenResponse {
                access_token,
                token_type: "bearer".to_string(),
                expires_in: ttl.num_seconds(),
                user,
            },
            "Account created",
        )),
    ))
}

/// Authenticates by username or email and returns a fresh token.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown account or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    req.validate()?;

    // Same message for unknown account and bad password
    let user = User::find_by_login(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let ttl = state.config.token_ttl();
    let access_token = jwt::issue_token(user.id, ttl, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "login");

    Ok(Json(ApiResponse::success(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: ttl.num_seconds(),
        user,
    })))
}
