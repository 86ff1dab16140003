/// Application state and router builder

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tasknest_shared::auth::middleware::{admin_gate, create_auth_gate};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned per request via `State`
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── /health                       # Public
/// └── /api/v1/
///     ├── /auth/register, /auth/login   # Public
///     ├── /users/me                     # Authenticated
///     ├── /users, /users/:id            # Authenticated + admin
///     ├── /categories...                # Authenticated
///     ├── /tags...                      # Authenticated
///     └── /tasks...                     # Authenticated
/// ```
///
/// Middleware, outermost first: trace, CORS, then the auth gate on
/// protected routes and the admin gate inside it on /users admin
/// routes.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Admin account management; the admin gate runs after auth
    let admin_user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .route("/:id", put(routes::users::update_user))
        .route("/:id", delete(routes::users::delete_user))
        .layer(axum::middleware::from_fn(admin_gate));

    let user_routes = Router::new()
        .route("/me", get(routes::users::me))
        .route("/me", put(routes::users::update_me))
        .route("/me", delete(routes::users::delete_me))
        .merge(admin_user_routes);

    let category_routes = Router::new()
        .route("/", get(routes::categories::list_categories))
        .route("/", post(routes::categories::create_category))
        .route("/stats", get(routes::categories::category_stats))
        .route("/:id", get(routes::categories::get_category))
        .route("/:id", put(routes::categories::update_category))
        .route("/:id", delete(routes::categories::delete_category));

    let tag_routes = Router::new()
        .route("/", get(routes::tags::list_tags))
        .route("/", post(routes::tags::create_tag))
        .route("/stats", get(routes::tags::tag_stats))
        .route("/:id", get(routes::tags::get_tag))
        .route("/:id", put(routes::tags::update_tag))
        .route("/:id", delete(routes::tags::delete_tag));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/search", get(routes::tasks::search_tasks))
        .route("/stats", get(routes::tasks::task_stats))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/tags/:tag_id", post(routes::tasks::add_tag))
        .route("/:id/tags/:tag_id", delete(routes::tasks::remove_tag));

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/categories", category_routes)
        .nest("/tags", tag_routes)
        .nest("/tasks", task_routes)
        .layer(axum::middleware::from_fn(create_auth_gate(
            state.db.clone(),
            state.config.jwt.secret.clone(),
        )));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

