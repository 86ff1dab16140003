/// Authentication middleware for Axum
///
/// The auth gate validates the `Authorization: Bearer <token>` header,
/// loads the account it names, and inserts a [`CurrentUser`] into the
/// request extensions. Every failure short of a database error maps to
/// 401; the gate never reveals whether the token or the account was
/// the problem.
///
/// The admin gate runs after the auth gate and is a plain role check
/// on the already-resolved user.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use super::authorization::require_role;
use super::jwt::verify_token;
use crate::models::user::{Role, User};

/// The authenticated account, available to handlers via `Extension`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Error type for the auth gate
#[derive(Debug)]
pub enum AuthError {
    /// Missing Authorization header
    MissingCredentials,

    /// Header present but not a Bearer token
    InvalidFormat,

    /// Token failed verification
    InvalidToken(String),

    /// Token was valid but the account no longer exists
    UnknownUser,

    /// Database lookup failed
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials".to_string())
            }
            AuthError::InvalidFormat => {
                (StatusCode::UNAUTHORIZED, "Expected Bearer token".to_string())
            }
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::UnknownUser => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AuthError::DatabaseError(msg) => {
                tracing::error!(error = %msg, "auth gate database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "status": "error", "message": message }));
        (status, body).into_response()
    }
}

/// Bearer token authentication gate
///
/// On success the request carries a [`CurrentUser`] extension.
pub async fn auth_gate(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let claims =
        verify_token(token, &secret).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    // A valid token for a deleted account is still a rejection
    let user = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// Creates an auth gate closure capturing the pool and JWT secret,
/// suitable for `axum::middleware::from_fn`
pub fn create_auth_gate(
    pool: PgPool,
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    let secret = secret.into();
    move |req, next| {
        let pool = pool.clone();
        let secret = secret.clone();
        Box::pin(auth_gate(pool, secret, req, next))
    }
}

/// Admin role gate, layered inside the auth gate.
///
/// Reads the [`CurrentUser`] the auth gate inserted; a missing
/// extension means the gates were layered wrong and is treated as
/// unauthenticated rather than a panic.
pub async fn admin_gate(req: Request, next: Next) -> Response {
    let Some(CurrentUser(user)) = req.extensions().get::<CurrentUser>().cloned() else {
        return AuthError::MissingCredentials.into_response();
    };

    if let Err(err) = require_role(&user, Role::Admin) {
        return err.into_response();
    }

    next.run(req).await
}
