use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{page_offset, SortOrder};

/// A per-user label attached to tasks through the `task_tags` join table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTag {
    pub name: String,
    pub user_id: Uuid,
}

/// A tag with the number of tasks carrying it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TagStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tag: Tag,
    pub task_count: i64,
}

fn sort_column(field: &str) -> Option<&'static str> {
    match field {
        "name" => Some("name"),
        "created_at" => Some("created_at"),
        "updated_at" => Some("updated_at"),
        _ => None,
    }
}

impl Tag {
    pub async fn create(pool: &PgPool, data: CreateTag) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.name)
        .bind(data.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Name lookup used to reject duplicate tag names per user.
    /// Uniqueness is enforced at the route layer, not the schema.
    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = $1 AND user_id = $2")
            .bind(name)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_name(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags SET name = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a tag; its `task_tags` rows cascade, tasks are untouched
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
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
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        let mut query = String::from("SELECT * FROM tags WHERE user_id = $1");
        if let Some(column) = sort_column(sort_by) {
            query.push_str(&format!(" ORDER BY {} {}", column, sort_order.as_sql()));
        }
        query.push_str(" LIMIT $2 OFFSET $3");

        let tags = sqlx::query_as::<_, Tag>(&query)
            .bind(user_id)
            .bind(per_page)
            .bind(page_offset(page, per_page))
            .fetch_all(pool)
            .await?;

        Ok((tags, total))
    }

    /// Usage counts for every tag the user owns, most used first
    pub async fn stats(pool: &PgPool, user_id: Uuid) -> Result<Vec<TagStats>, sqlx::Error> {
        sqlx::query_as::<_, TagStats>(
            r#"
            SELECT t.*, COUNT(tt.task_id) AS task_count
            FROM tags t
            LEFT JOIN task_tags tt ON tt.tag_id = t.id
            WHERE t.user_id = $1
            GROUP BY t.id
            ORDER BY task_count DESC, t.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_column_allow_list() {
        assert_eq!(sort_column("name"), Some("name"));
        assert_eq!(sort_column("created_at"), Some("created_at"));
        assert_eq!(sort_column("task_count"), None);
    }

    #[test]
    fn test_stats_serialization_flattens_tag() {
        let stats = TagStats {
            tag: Tag {
                id: Uuid::new_v4(),
                name: "urgent".to_string(),
                user_id: Uuid::new_v4(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            task_count: 3,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["name"], "urgent");
        assert_eq!(json["task_count"], 3);
    }
}
