/// Category endpoints
///
/// # Endpoints
///
/// - `GET /api/v1/categories` - List own categories
/// - `POST /api/v1/categories` - Create a category
/// - `GET /api/v1/categories/stats` - Task statistics per category
/// - `GET /api/v1/categories/:id` - Fetch a category
/// - `PUT /api/v1/categories/:id` - Update a category
/// - `DELETE /api/v1/categories/:id` - Delete (tasks are detached)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{double_option, ApiResponse, ListResponse, PageParams},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tasknest_shared::{
    auth::middleware::CurrentUser,
    models::{
        category::{Category, CategoryStats, CreateCategory, UpdateCategory},
        SortOrder,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,

    #[validate(length(max = 256, message = "Description must be at most 256 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: Option<String>,

    /// Present-but-null clears the description
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<Category>>> {
    let page = params.page();
    let per_page = params.per_page();
    let sort_by = params.sort_by("name");
    let sort_order = params.sort_order_lenient(SortOrder::Asc);

    let (categories, total) =
        Category::list(&state.db, user.id, &sort_by, sort_order, page, per_page).await?;

    Ok(Json(ListResponse::new(categories, page, per_page, total)))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Category>>)> {
    req.validate()?;

    let category = Category::create(
        &state.db,
        CreateCategory {
            name: req.name,
            description: req.description,
            user_id: user.id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(category, "Category created")),
    ))
}

/// Task statistics for every category the user owns
pub async fn category_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<Vec<CategoryStats>>>> {
    let categories = Category::find_all(&state.db, user.id).await?;

    let mut stats = Vec::with_capacity(categories.len());
    for category in &categories {
        stats.push(category.stats(&state.db).await?);
    }

    Ok(Json(ApiResponse::success(stats)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Category>>> {
    let category = Category::find_by_id(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(ApiResponse::success(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<ApiResponse<Category>>> {
    req.validate()?;

    let category = Category::update(
        &state.db,
        id,
        user.id,
        UpdateCategory {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !Category::delete(&state.db, id, user.id).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Category deleted",
    )))
}
