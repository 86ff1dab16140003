/// User profile and account administration endpoints
///
/// # Endpoints
///
/// - `GET /api/v1/users/me` - Own profile
/// - `PUT /api/v1/users/me` - Update own profile
/// - `DELETE /api/v1/users/me` - Delete own account
/// - `GET /api/v1/users` - List accounts (admin)
/// - `GET /api/v1/users/:id` - Fetch an account (admin)
/// - `PUT /api/v1/users/:id` - Update an account (admin)
/// - `DELETE /api/v1/users/:id` - Delete an account (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{ApiResponse, ListResponse, PageParams},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tasknest_shared::{
    auth::{middleware::CurrentUser, password},
    models::{
        user::{UpdateUser, User},
        SortOrder,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Hashes the password (when present) and produces the patch
    fn into_patch(self) -> Result<UpdateUser, ApiError> {
        let password_hash = match self.password {
            Some(password) => Some(password::hash_password(&password)?),
            None => None,
        };
        Ok(UpdateUser {
            username: self.username,
            email: self.email,
            password_hash,
        })
    }
}

pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    req.validate()?;

    let updated = User::update(&state.db, user.id, req.into_patch()?)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !User::delete(&state.db, user.id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user.id, "account deleted");

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Account deleted",
    )))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<User>>> {
    let page = params.page();
    let per_page = params.per_page();
    let sort_by = params.sort_by("created_at");
    let sort_order = params.sort_order_lenient(SortOrder::Desc);

    let (users, total) = User::list(&state.db, &sort_by, sort_order, page, per_page).await?;

    Ok(Json(ListResponse::new(users, page, per_page, total)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    req.validate()?;

    let updated = User::update(&state.db, id, req.into_patch()?)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Account deleted",
    )))
}
