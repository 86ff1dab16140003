/// Integration tests for the ownership-scoped repositories.
///
/// These tests need a running PostgreSQL database. Point
/// TEST_DATABASE_URL at a scratch database to enable them; they are
/// skipped when the variable is unset.
///
/// Run with: TEST_DATABASE_URL=postgresql://... cargo test --test repository_tests

use sqlx::PgPool;
use tasknest_shared::db::migrations::run_migrations;
use tasknest_shared::db::pool::{create_pool, DatabaseConfig};
use tasknest_shared::models::{
    tag::{CreateTag, Tag},
    task::{CreateTask, Task, TaskPriority, TaskStatus},
    user::{CreateUser, Role, User},
    SortOrder,
};
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url,
        max_connections: 5,
        ..Default::default()
    };
    let pool = create_pool(config).await.expect("connect to test database");
    run_migrations(&pool).await.expect("run migrations");
    Some(pool)
}

async fn create_test_user(pool: &PgPool, prefix: &str) -> User {
    let suffix = Uuid::new_v4().simple().to_string();
    User::create(
        pool,
        CreateUser {
            username: format!("{}_{}", prefix, &suffix[..12]),
            email: format!("{}_{}@example.com", prefix, &suffix[..12]),
            password_hash: "$argon2id$test-not-a-real-hash".to_string(),
            role: Role::User,
        },
    )
    .await
    .expect("create user")
}

fn task_for(user: &User, title: &str, tag_ids: Vec<Uuid>) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: None,
        status: TaskStatus::ToDo,
        priority: TaskPriority::Medium,
        due_date: None,
        user_id: user.id,
        category_id: None,
        tag_ids,
    }
}

#[tokio::test]
async fn test_task_visibility_scoped_to_owner() {
    let Some(pool) = test_pool().await else { return };

    let alice = create_test_user(&pool, "alice").await;
    let bob = create_test_user(&pool, "bob").await;

    let task = Task::create(&pool, task_for(&alice, "Quarterly review", vec![]))
        .await
        .expect("create task");

    // The owner sees it, another account does not
    assert!(Task::find_by_id(&pool, task.id, alice.id)
        .await
        .expect("lookup")
        .is_some());
    assert!(Task::find_by_id(&pool, task.id, bob.id)
        .await
        .expect("lookup")
        .is_none());

    let (bob_tasks, bob_total) =
        Task::list(&pool, bob.id, "created_at", SortOrder::Desc, 1, 100)
            .await
            .expect("list");
    assert_eq!(bob_total, 0);
    assert!(bob_tasks.iter().all(|t| t.id != task.id));

    // A foreign delete is a no-op, not an error
    assert!(!Task::delete(&pool, task.id, bob.id).await.expect("delete"));
    assert!(Task::find_by_id(&pool, task.id, alice.id)
        .await
        .expect("lookup")
        .is_some());

    User::delete(&pool, alice.id).await.expect("cleanup");
    User::delete(&pool, bob.id).await.expect("cleanup");
}

#[tokio::test]
async fn test_duplicate_email_is_a_unique_violation() {
    let Some(pool) = test_pool().await else { return };

    let user = create_test_user(&pool, "dupe").await;

    let err = User::create(
        &pool,
        CreateUser {
            username: format!("other_{}", &Uuid::new_v4().simple().to_string()[..12]),
            email: user.email.clone(),
            password_hash: "$argon2id$test-not-a-real-hash".to_string(),
            role: Role::User,
        },
    )
    .await
    .expect_err("duplicate email must be rejected");

    // This is the exact shape the API layer maps onto 409 Conflict
    match err {
        sqlx::Error::Database(db_err) => {
            assert!(db_err.is_unique_violation());
            assert!(db_err.constraint().unwrap_or_default().contains("email"));
        }
        other => panic!("expected a database error, got {:?}", other),
    }

    User::delete(&pool, user.id).await.expect("cleanup");
}

#[tokio::test]
async fn test_deleting_tag_detaches_it_from_tasks() {
    let Some(pool) = test_pool().await else { return };

    let user = create_test_user(&pool, "tagger").await;
    let tag = Tag::create(
        &pool,
        CreateTag {
            name: "urgent".to_string(),
            user_id: user.id,
        },
    )
    .await
    .expect("create tag");

    let task = Task::create(&pool, task_for(&user, "Ship release", vec![tag.id]))
        .await
        .expect("create task");

    let detail = task.clone().detail(&pool).await.expect("detail");
    assert_eq!(detail.tags, vec!["urgent".to_string()]);

    assert!(Tag::delete(&pool, tag.id, user.id).await.expect("delete tag"));

    // The task survives with the association gone
    let task = Task::find_by_id(&pool, task.id, user.id)
        .await
        .expect("lookup")
        .expect("task still present");
    let detail = task.detail(&pool).await.expect("detail");
    assert!(detail.tags.is_empty());

    User::delete(&pool, user.id).await.expect("cleanup");
}
