use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{page_offset, SortOrder};

/// Workflow state, stored as the `task_status` Postgres enum.
/// "Ready" is the terminal state and counts as completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[sqlx(rename = "To Do")]
    #[serde(rename = "To Do")]
    ToDo,
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sqlx(rename = "Ready")]
    Ready,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

/// Stored as the `task_priority` Postgres enum; the declaration order
/// Low < Medium < High is what priority sorting relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// Patch for updating a task; `None` fields are left untouched.
/// Nullable columns use a nested Option so they can be cleared, and
/// `tag_ids` replaces the full tag set when present.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub category_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.category_id.is_none()
            && self.tag_ids.is_none()
    }
}

/// Search filters for tasks. Everything is optional; filters compose
/// with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct TaskSearch {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
    /// Inclusive due-date bounds
    pub due_date_from: Option<NaiveDate>,
    pub due_date_to: Option<NaiveDate>,
    /// Tri-state: `Some(true)` keeps only overdue tasks, `Some(false)`
    /// keeps the complement (no due date, or due today or later), `None`
    /// does not filter on it at all.
    pub is_overdue: Option<bool>,
    pub sort_by: TaskSortField,
    pub sort_order: SortOrder,
}

/// Sort fields accepted by search. Unlike the plain list endpoints,
/// search rejects unknown fields instead of ignoring them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Status,
    Title,
}

impl TaskSortField {
    fn as_column(&self) -> &'static str {
        match self {
            TaskSortField::CreatedAt => "created_at",
            TaskSortField::UpdatedAt => "updated_at",
            TaskSortField::DueDate => "due_date",
            TaskSortField::Priority => "priority",
            TaskSortField::Status => "status",
            TaskSortField::Title => "title",
        }
    }
}

impl FromStr for TaskSortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created_at" => Ok(TaskSortField::CreatedAt),
            "updated_at" => Ok(TaskSortField::UpdatedAt),
            "due_date" => Ok(TaskSortField::DueDate),
            "priority" => Ok(TaskSortField::Priority),
            "status" => Ok(TaskSortField::Status),
            "title" => Ok(TaskSortField::Title),
            other => Err(format!("invalid sort field '{}'", other)),
        }
    }
}

/// A task joined with its category name and tag names for responses
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_overdue: bool,
}

/// Aggregate counts across all of a user's tasks
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatsReport {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
    pub due_today: i64,
    /// Percentage, rounded to two decimals; 100.0 for an empty account
    pub completion_rate: f64,
}

fn completion_percentage(completed: i64, total: i64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (completed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

fn sort_column(field: &str) -> Option<&'static str> {
    match field {
        "title" => Some("title"),
        "status" => Some("status"),
        "priority" => Some("priority"),
        "due_date" => Some("due_date"),
        "created_at" => Some("created_at"),
        "updated_at" => Some("updated_at"),
        _ => None,
    }
}

/// Builds the WHERE clause for [`Task::search`]. Returns the conditions
/// and the number of placeholders consumed; binds must be applied in the
/// same order the conditions are appended here.
fn search_conditions(search: &TaskSearch) -> (String, i32) {
    let mut conditions = String::from("user_id = $1");
    let mut bind_count = 1;

    if search.title.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND title ILIKE ${}", bind_count));
    }
    if search.status.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND status = ${}", bind_count));
    }
    if search.priority.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND priority = ${}", bind_count));
    }
    if search.category_id.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND category_id = ${}", bind_count));
    }
    if !search.tag_ids.is_empty() {
        bind_count += 1;
        conditions.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM task_tags tt \
             WHERE tt.task_id = tasks.id AND tt.tag_id = ANY(${}))",
            bind_count
        ));
    }
    match search.is_overdue {
        Some(true) => {
            conditions.push_str(" AND due_date < CURRENT_DATE AND status <> 'Ready'");
        }
        Some(false) => {
            conditions.push_str(" AND (due_date IS NULL OR due_date >= CURRENT_DATE)");
        }
        None => {}
    }
    if search.due_date_from.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND due_date >= ${}", bind_count));
    }
    if search.due_date_to.is_some() {
        bind_count += 1;
        conditions.push_str(&format!(" AND due_date <= ${}", bind_count));
    }

    (conditions, bind_count)
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Ready
    }

    /// A task is overdue once its due date has passed, regardless of
    /// status. Queries that report overdue work exclude Ready tasks on
    /// top of this.
    pub fn is_overdue(&self) -> bool {
        self.due_date
            .map(|due| due < Utc::now().date_naive())
            .unwrap_or(false)
    }

    /// Creates a task and attaches its tags in one transaction.
    /// Tag ids that do not belong to the user are skipped.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, user_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.user_id)
        .bind(data.category_id)
        .fetch_one(&mut *tx)
        .await?;

        for tag_id in &data.tag_ids {
            sqlx::query(
                r#"
                INSERT INTO task_tags (task_id, tag_id)
                SELECT $1, id FROM tags WHERE id = $2 AND user_id = $3
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(task.id)
            .bind(tag_id)
            .bind(data.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(task)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial update. When `tag_ids` is present the existing
    /// tag set is replaced wholesale, all inside one transaction.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id, user_id).await;
        }

        let mut tx = pool.begin().await?;

        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.category_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category_id = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 AND user_id = $2 RETURNING *");

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);
        if let Some(title) = &data.title {
            q = q.bind(title);
        }
        if let Some(description) = &data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }

        let task = match q.fetch_optional(&mut *tx).await? {
            Some(task) => task,
            None => return Ok(None),
        };

        if let Some(tag_ids) = &data.tag_ids {
            sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
                .bind(task.id)
                .execute(&mut *tx)
                .await?;
            for tag_id in tag_ids {
                sqlx::query(
                    r#"
                    INSERT INTO task_tags (task_id, tag_id)
                    SELECT $1, id FROM tags WHERE id = $2 AND user_id = $3
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(task.id)
                .bind(tag_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(Some(task))
    }

    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        sort_by: &str,
        sort_order: SortOrder,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        let mut query = String::from("SELECT * FROM tasks WHERE user_id = $1");
        if let Some(column) = sort_column(sort_by) {
            query.push_str(&format!(" ORDER BY {} {}", column, sort_order.as_sql()));
        }
        query.push_str(" LIMIT $2 OFFSET $3");

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(per_page)
            .bind(page_offset(page, per_page))
            .fetch_all(pool)
            .await?;

        Ok((tasks, total))
    }

    /// Filtered search with strict sort validation done by the caller.
    /// `is_overdue = Some(true)` means "past due and not Ready", which
    /// is narrower than [`Task::is_overdue`].
    pub async fn search(
        pool: &PgPool,
        user_id: Uuid,
        search: &TaskSearch,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let (conditions, bind_count) = search_conditions(search);

        let count_query = format!("SELECT COUNT(*) FROM tasks WHERE {}", conditions);
        let select_query = format!(
            "SELECT * FROM tasks WHERE {} ORDER BY {} {} LIMIT ${} OFFSET ${}",
            conditions,
            search.sort_by.as_column(),
            search.sort_order.as_sql(),
            bind_count + 1,
            bind_count + 2,
        );

        let pattern = search.title.as_ref().map(|t| format!("%{}%", t));

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query).bind(user_id);
        let mut select_q = sqlx::query_as::<_, Task>(&select_query).bind(user_id);

        if let Some(pattern) = &pattern {
            count_q = count_q.bind(pattern);
            select_q = select_q.bind(pattern);
        }
        if let Some(status) = search.status {
            count_q = count_q.bind(status);
            select_q = select_q.bind(status);
        }
        if let Some(priority) = search.priority {
            count_q = count_q.bind(priority);
            select_q = select_q.bind(priority);
        }
        if let Some(category_id) = search.category_id {
            count_q = count_q.bind(category_id);
            select_q = select_q.bind(category_id);
        }
        if !search.tag_ids.is_empty() {
            count_q = count_q.bind(&search.tag_ids);
            select_q = select_q.bind(&search.tag_ids);
        }
        if let Some(due_date_from) = search.due_date_from {
            count_q = count_q.bind(due_date_from);
            select_q = select_q.bind(due_date_from);
        }
        if let Some(due_date_to) = search.due_date_to {
            count_q = count_q.bind(due_date_to);
            select_q = select_q.bind(due_date_to);
        }

        let total = count_q.fetch_one(pool).await?;
        let tasks = select_q
            .bind(per_page)
            .bind(page_offset(page, per_page))
            .fetch_all(pool)
            .await?;

        Ok((tasks, total))
    }

    /// Attaches a tag. Returns `false` when the association already
    /// existed or the tag is not owned by the user.
    pub async fn add_tag(
        pool: &PgPool,
        task_id: Uuid,
        tag_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO task_tags (task_id, tag_id)
            SELECT $1, id FROM tags WHERE id = $2 AND user_id = $3
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(tag_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Detaches a tag. Returns `false` when it was not attached.
    pub async fn remove_tag(
        pool: &PgPool,
        task_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_tags WHERE task_id = $1 AND tag_id = $2")
            .bind(task_id)
            .bind(tag_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Expands a task into its response shape with category and tag
    /// names resolved
    pub async fn detail(self, pool: &PgPool) -> Result<TaskDetail, sqlx::Error> {
        let category = match self.category_id {
            Some(category_id) => {
                sqlx::query_scalar::<_, String>("SELECT name FROM categories WHERE id = $1")
                    .bind(category_id)
                    .fetch_optional(pool)
                    .await?
            }
            None => None,
        };

        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name FROM tags t
            JOIN task_tags tt ON tt.tag_id = t.id
            WHERE tt.task_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?;

        let is_overdue = self.is_overdue();
        Ok(TaskDetail {
            task: self,
            category,
            tags,
            is_overdue,
        })
    }

    /// Aggregate counts for a user's tasks. An account with no tasks
    /// reports a 100% completion rate.
    pub async fn stats(pool: &PgPool, user_id: Uuid) -> Result<TaskStatsReport, sqlx::Error> {
        let total_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        let completed_tasks: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status = 'Ready'",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let overdue_tasks: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE user_id = $1 AND due_date < CURRENT_DATE AND status <> 'Ready'
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let due_today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND due_date = CURRENT_DATE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(TaskStatsReport {
            total_tasks,
            completed_tasks,
            overdue_tasks,
            due_today,
            completion_rate: completion_percentage(completed_tasks, total_tasks),
        })
    }
}
