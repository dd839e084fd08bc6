//! Liveness endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use crate::database::service::DatabaseHealth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub databases: Option<DatabaseHealth>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let databases = match state.database {
        Some(ref database) => Some(database.health().await),
        None => None,
    };

    let healthy = databases.map_or(true, |d| d.is_healthy());
    let (code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: crate::VERSION,
            databases,
        }),
    )
}
