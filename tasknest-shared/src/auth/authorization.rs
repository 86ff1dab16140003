/// Role checks for admin-only routes
///
/// Authorization is a pure function over an already-authenticated user.
/// The auth gate resolves the user first; handlers and middleware then
/// call [`require_role`] as a separate, explicit step.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::user::{Role, User};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User's role does not meet the requirement
    #[error("Insufficient permissions: requires {required:?} role")]
    InsufficientRole { required: Role },
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (StatusCode::FORBIDDEN, body).into_response()
    }
}

/// Checks that a user holds the required role.
///
/// Admins satisfy every requirement; plain users only satisfy
/// `Role::User`.
pub fn require_role(user: &User, required: Role) -> Result<(), AuthzError> {
    let allowed = match required {
        Role::User => true,
        Role::Admin => user.role == Role::Admin,
    };

    if !allowed {
        return Err(AuthzError::InsufficientRole { required });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_satisfies_everything() {
        let admin = user_with_role(Role::Admin);
        assert!(require_role(&admin, Role::User).is_ok());
        assert!(require_role(&admin, Role::Admin).is_ok());
    }

    #[test]
    fn test_user_cannot_be_admin() {
        let user = user_with_role(Role::User);
        assert!(require_role(&user, Role::User).is_ok());
        assert!(require_role(&user, Role::Admin).is_err());
    }

    #[test]
    fn test_forbidden_response() {
        let response = AuthzError::InsufficientRole {
            required: Role::Admin,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
