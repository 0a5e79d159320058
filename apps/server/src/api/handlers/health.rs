//! Liveness and service info endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value as JsonValue};

use crate::state::AppState;

/// Health check (GET /health)
///
/// Issues an uncached round-trip to the warehouse; 503 when it fails.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let checked_at = chrono::Utc::now().to_rfc3339();
    match state.dataset_service.warehouse_version().await {
        Ok(version) => Json(json!({
            "status": "healthy",
            "service": "fedspend",
            "warehouse": version,
            "datasets": dataset_tables(&state),
            "checked_at": checked_at,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Warehouse health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "fedspend",
                    "message": e.to_string(),
                    "checked_at": checked_at,
                })),
            )
                .into_response()
        }
    }
}

/// Service info (GET /)
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "fedspend",
        "version": env!("CARGO_PKG_VERSION"),
        "datasets": dataset_tables(&state),
    }))
}

fn dataset_tables(state: &AppState) -> Map<String, JsonValue> {
    state
        .dataset_service
        .datasets()
        .map(|(name, table)| (name.to_string(), JsonValue::String(table.to_string())))
        .collect()
}
