/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/v1/tasks` - List own tasks
/// - `POST /api/v1/tasks` - Create a task (with optional tags)
/// - `GET /api/v1/tasks/search` - Filtered search
/// - `GET /api/v1/tasks/stats` - Aggregate counts
/// - `GET /api/v1/tasks/:id` - Fetch a task
/// - `PUT /api/v1/tasks/:id` - Update a task
/// - `DELETE /api/v1/tasks/:id` - Delete a task
/// - `POST /api/v1/tasks/:id/tags/:tag_id` - Attach a tag
/// - `DELETE /api/v1/tasks/:id/tags/:tag_id` - Detach a tag

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
use chrono::NaiveDate;
use serde::Deserialize;
use tasknest_shared::{
    auth::middleware::CurrentUser,
    models::{
        tag::Tag,
        task::{
            CreateTask, Task, TaskDetail, TaskPriority, TaskSearch, TaskSortField, TaskStatsReport,
            TaskStatus, UpdateTask,
        },
        SortOrder,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 128, message = "Title must be 1-128 characters"))]
    pub title: String,

    #[validate(length(max = 1024, message = "Description must be at most 1024 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    pub due_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,

    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 128, message = "Title must be 1-128 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,

    /// Replaces the full tag set when present
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Search query parameters. `sort_by` and `sort_order` are validated
/// strictly here, unlike the lenient plain lists.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive title substring
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,

    /// Comma-separated tag ids
    pub tag_ids: Option<String>,

    pub due_date_from: Option<NaiveDate>,
    pub due_date_to: Option<NaiveDate>,

    /// Absent means no overdue filtering; `false` selects the
    /// not-overdue complement
    pub is_overdue: Option<bool>,

    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl SearchParams {
    fn into_search(self) -> Result<TaskSearch, ApiError> {
        let sort_by = match self.sort_by.as_deref() {
            Some(raw) => raw
                .parse::<TaskSortField>()
                .map_err(ApiError::BadRequest)?,
            None => TaskSortField::default(),
        };
        let sort_order = match self.sort_order.as_deref() {
            Some(raw) => raw.parse::<SortOrder>().map_err(ApiError::BadRequest)?,
            None => SortOrder::Desc,
        };

        if let (Some(from), Some(to)) = (self.due_date_from, self.due_date_to) {
            if to < from {
                return Err(ApiError::BadRequest(
                    "due_date_to must not be earlier than due_date_from".to_string(),
                ));
            }
        }

        let tag_ids = match &self.tag_ids {
            Some(raw) => raw
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.trim()
                        .parse::<Uuid>()
                        .map_err(|_| ApiError::BadRequest(format!("invalid tag id '{}'", s)))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(TaskSearch {
            title: self.title.clone(),
            status: self.status,
            priority: self.priority,
            category_id: self.category_id,
            tag_ids,
            due_date_from: self.due_date_from,
            due_date_to: self.due_date_to,
            is_overdue: self.is_overdue,
            sort_by,
            sort_order,
        })
    }
}

/// Expands tasks into their response shape one by one
async fn to_details(state: &AppState, tasks: Vec<Task>) -> Result<Vec<TaskDetail>, sqlx::Error> {
    let mut details = Vec::with_capacity(tasks.len());
    for task in tasks {
        details.push(task.detail(&state.db).await?);
    }
    Ok(details)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ListResponse<TaskDetail>>> {
    let page = params.page();
    let per_page = params.per_page();
    let sort_by = params.sort_by("created_at");
    let sort_order = params.sort_order_lenient(SortOrder::Desc);

    let (tasks, total) =
        Task::list(&state.db, user.id, &sort_by, sort_order, page, per_page).await?;
    let details = to_details(&state, tasks).await?;

    Ok(Json(ListResponse::new(details, page, per_page, total)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TaskDetail>>)> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            due_date: req.due_date,
            user_id: user.id,
            category_id: req.category_id,
            tag_ids: req.tag_ids,
        },
    )
    .await?;

    tracing::debug!(task_id = %task.id, "task created");

    let detail = task.detail(&state.db).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(detail, "Task created")),
    ))
}

pub async fn search_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ListResponse<TaskDetail>>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let search = params.into_search()?;

    let (tasks, total) = Task::search(&state.db, user.id, &search, page, per_page).await?;
    let details = to_details(&state, tasks).await?;

    Ok(Json(ListResponse::new(details, page, per_page, total)))
}

pub async fn task_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<TaskStatsReport>>> {
    let report = Task::stats(&state.db, user.id).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = Task::find_by_id(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let detail = task.detail(&state.db).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    req.validate()?;

    let task = Task::update(
        &state.db,
        id,
        user.id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            category_id: req.category_id,
            tag_ids: req.tag_ids,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let detail = task.detail(&state.db).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !Task::delete(&state.db, id, user.id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(ApiResponse::with_message(
        serde_json::json!(null),
        "Task deleted",
    )))
}

pub async fn add_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = Task::find_by_id(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Tag::find_by_id(&state.db, tag_id, user.id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Failed to add tag to task".to_string()))?;

    // Attaching an already-attached tag is idempotent
    Task::add_tag(&state.db, task.id, tag_id, user.id).await?;

    let detail = task.detail(&state.db).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = Task::find_by_id(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !Task::remove_tag(&state.db, task.id, tag_id).await? {
        return Err(ApiError::BadRequest(
            "Failed to remove tag from task".to_string(),
        ));
    }

    let detail = task.detail(&state.db).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: serde_json::Value) -> SearchParams {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_search_params_overdue_absent_vs_false() {
        let absent = params(serde_json::json!({})).into_search().unwrap();
        assert_eq!(absent.is_overdue, None);

        let explicit_false = params(serde_json::json!({ "is_overdue": false }))
            .into_search()
            .unwrap();
        assert_eq!(explicit_false.is_overdue, Some(false));

        let explicit_true = params(serde_json::json!({ "is_overdue": true }))
            .into_search()
            .unwrap();
        assert_eq!(explicit_true.is_overdue, Some(true));
    }

    #[test]
    fn test_search_params_wire_names() {
        let search = params(serde_json::json!({
            "title": "report",
            "due_date_from": "2025-01-01",
            "due_date_to": "2025-12-31",
        }))
        .into_search()
        .unwrap();
        assert_eq!(search.title.as_deref(), Some("report"));
        assert_eq!(
            search.due_date_from,
            Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        );
        assert_eq!(
            search.due_date_to,
            Some(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_search_params_rejects_inverted_due_range() {
        let result = params(serde_json::json!({
            "due_date_from": "2025-12-31",
            "due_date_to": "2025-01-01",
        }))
        .into_search();
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        // Equal bounds are a valid one-day window
        assert!(params(serde_json::json!({
            "due_date_from": "2025-06-15",
            "due_date_to": "2025-06-15",
        }))
        .into_search()
        .is_ok());
    }

    #[test]
    fn test_search_params_rejects_unknown_sort_field() {
        let result = params(serde_json::json!({ "sort_by": "user_id" })).into_search();
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_search_params_tag_ids_csv() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let search = params(serde_json::json!({ "tag_ids": format!("{},{}", a, b) }))
            .into_search()
            .unwrap();
        assert_eq!(search.tag_ids, vec![a, b]);

        let result = params(serde_json::json!({ "tag_ids": "not-a-uuid" })).into_search();
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
