/// Health check endpoint
///
/// Reports server liveness and database connectivity. The endpoint
/// stays at 200 even when the database is down so load balancers can
/// tell "degraded" from "gone".

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub db_connection: bool,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let db_connection = sqlx::query("SELECT 1").fetch_one(&state.db).await.is_ok();

    Ok(Json(HealthResponse {
        status: if db_connection {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        db_connection,
    }))
}
