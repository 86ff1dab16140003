use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::Task;
use super::{page_offset, SortOrder};

/// A per-user grouping for tasks
///
/// Deleting a category does not delete its tasks; the foreign key is
/// ON DELETE SET NULL so they become uncategorized instead.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub user_id: Uuid,
}

/// Patch for updating a category; `None` fields are left untouched.
/// `description` uses a nested Option so it can be cleared explicitly.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl UpdateCategory {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Per-category task statistics
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    #[serde(flatten)]
    pub category: Category,
    pub task_count: i64,
    pub completed_count: i64,
    pub overdue_count: i64,
    pub completion_rate: f64,
}

fn sort_column(field: &str) -> Option<&'static str> {
    match field {
        "name" => Some("name"),
        "created_at" => Some("created_at"),
        "updated_at" => Some("updated_at"),
        _ => None,
    }
}

impl Category {
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, user_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.user_id)
        .fetch_one(pool)
        .await
    }

    /// Fetches a category only if it belongs to the given user
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id, user_id).await;
        }

        let mut query = String::from("UPDATE categories SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 AND user_id = $2 RETURNING *");

        let mut q = sqlx::query_as::<_, Category>(&query).bind(id).bind(user_id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
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
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        let mut query = String::from("SELECT * FROM categories WHERE user_id = $1");
        if let Some(column) = sort_column(sort_by) {
            query.push_str(&format!(" ORDER BY {} {}", column, sort_order.as_sql()));
        }
        query.push_str(" LIMIT $2 OFFSET $3");

        let categories = sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .bind(per_page)
            .bind(page_offset(page, per_page))
            .fetch_all(pool)
            .await?;

        Ok((categories, total))
    }

    /// Every category the user owns, unpaginated, name order. Used by
    /// the stats aggregation so no category is dropped.
    pub async fn find_all(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Computes task statistics for this category.
    ///
    /// An empty category reports a 100% completion rate. A task counts
    /// as overdue here only when it is past due and not yet Ready.
    pub async fn stats(&self, pool: &PgPool) -> Result<CategoryStats, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE category_id = $1 AND user_id = $2",
        )
        .bind(self.id)
        .bind(self.user_id)
        .fetch_all(pool)
        .await?;

        let today = Utc::now().date_naive();
        let task_count = tasks.len() as i64;
        let completed_count = tasks.iter().filter(|t| t.is_completed()).count() as i64;
        let overdue_count = tasks
            .iter()
            .filter(|t| !t.is_completed() && t.due_date.map(|d| d < today).unwrap_or(false))
            .count() as i64;
        let completion_rate = if task_count == 0 {
            100.0
        } else {
            completed_count as f64 / task_count as f64 * 100.0
        };

        Ok(CategoryStats {
            category: self.clone(),
            task_count,
            completed_count,
            overdue_count,
            completion_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateCategory::default().is_empty());
        let clear_description = UpdateCategory {
            description: Some(None),
            ..Default::default()
        };
        assert!(!clear_description.is_empty());
    }

    #[test]
    fn test_sort_column_allow_list() {
        assert_eq!(sort_column("name"), Some("name"));
        assert_eq!(sort_column("user_id"), None);
        assert_eq!(sort_column(""), None);
    }

    #[test]
    fn test_stats_serialization_flattens_category() {
        let category = Category {
            id: Uuid::new_v4(),
            name: "Work".to_string(),
            description: None,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let stats = CategoryStats {
            category: category.clone(),
            task_count: 4,
            completed_count: 2,
            overdue_count: 1,
            completion_rate: 50.0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["name"], "Work");
        assert_eq!(json["task_count"], 4);
        assert_eq!(json["completion_rate"], 50.0);
    }
}
