//! Banner and health endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::db;

pub async fn root() -> &'static str {
    "Gold Shop Management System Backend"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub version: &'static str,
}

pub async fn health_check(State(pool): State<PgPool>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database, latency_ms) = match db::check_health(&pool).await {
        Ok(latency) => (
            StatusCode::OK,
            "healthy",
            "connected".to_string(),
            Some(latency.as_millis() as u64),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", e.to_string(), None)
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            latency_ms,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
