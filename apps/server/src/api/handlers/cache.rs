//! Result cache administration

use axum::{extract::State, Json};
use fedspend_query::CacheStats;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    /// Substring of the cache keys to evict, e.g. a dataset name. Omit to clear everything.
    pub pattern: Option<String>,
}

/// Evict cached results (POST /api/cache/invalidate)
pub async fn invalidate(
    State(state): State<AppState>,
    body: Option<Json<InvalidateRequest>>,
) -> Json<JsonValue> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let pattern = request.pattern.filter(|p| !p.is_empty());
    let evicted = state.cache.invalidate(pattern.as_deref()).await;
    Json(json!({ "evicted": evicted, "pattern": pattern }))
}

/// Hit/miss counters (GET /api/cache/stats)
pub async fn stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}
