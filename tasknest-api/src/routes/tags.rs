/// Tag endpoints
///
/// Tag names are unique per user; duplicates are rejected here with a
/// 409 rather than by a schema constraint.
///
/// # Endpoints
///
/// - `GET /api/v1/tags` - List own tags
/// - `POST /api/v1/tags` - Create a tag
/// - `GET /api/v1/tags/stats` - Usage counts per tag
/// - `GET /api/v1/tags/:id` - Fetch a tag
/// - `PUT /api/v1/tags/:id` - Rename a tag
/// - `DELETE /api/v1/tags/:id` - Delete (associations go with it)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{ApiResponse, ListResponse, PageParams},
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
        tag::{CreateTag, Tag, TagStats},
        SortOrder,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TagRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,
}

pub async fn list_tags(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<Tag>>> {
    let page = params.page();
    let per_page = params.per_page();
    let sort_by = params.sort_by("name");
    let sort_order = params.sort_order_lenient(SortOrder::Asc);

    let (tags, total) =
        Tag::list(&state.db, user.id, &sort_by, sort_order, page, per_page).await?;

    Ok(Json(ListResponse::new(tags, page, per_page, total)))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<TagRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Tag>>)> {
    req.validate()?;

    if Tag::find_by_name(&state.db, &req.name, user.id).await?.is_some() {
        return Err(ApiError::Conflict("Tag already exists".to_string()));
    }

    let tag = Tag::create(
        &state.db,
        CreateTag {
            name: req.name,
            user_id: user.id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(tag, "Tag created")),
    ))
}

/// Usage counts for every tag the user owns, most used first
pub async fn tag_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<Vec<TagStats>>>> {
    let stats = Tag::stats(&state.db, user.id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Tag>>> {
    let tag = Tag::find_by_id(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Ok(Json(ApiResponse::success(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<TagRequest>,
) -> ApiResult<Json<ApiResponse<Tag>>> {
    req.validate()?;

    // Renaming onto another tag's name is a conflict; renaming onto
    // its own current name is a no-op
    if let Some(existing) = Tag::find_by_name(&state.db, &req.name, user.id).await? {
        if existing.id != id {
            return Err(ApiError::Conflict("Tag already exists".to_string()));
        }
    }

    let tag = Tag::update_name(&state.db, id, user.id, &req.name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Ok(Json(ApiResponse::success(tag)))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !Tag::delete(&state.db, id, user.id).await? {
        return Err(ApiError::NotFound("Tag not found".to_string()));
    }

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Tag deleted",
    )))
}
