use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::{
    error::ApiResult,
    models::{DatabaseHealth, HealthResponse},
    AppState,
};

/// Health check endpoint
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    debug!("Health check requested");

    let users = probe(state.users.pool()).await;
    let submissions = probe(state.db.pool()).await;

    let response = HealthResponse {
        status: if users.connected && submissions.connected {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        users,
        submissions,
    };

    Ok(Json(response))
}

async fn probe(pool: &Pool<Sqlite>) -> DatabaseHealth {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => DatabaseHealth {
            connected: true,
            message: "Database connection successful".to_string(),
        },
        Err(e) => DatabaseHealth {
            connected: false,
            message: format!("Database connection failed: {}", e),
        },
    }
}
