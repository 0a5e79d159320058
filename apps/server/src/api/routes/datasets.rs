//! Dataset and cache routes, nested under `/api`

use axum::{
    routing::{get, post},
    Router,
};

use crate::{api::handlers, state::AppState};

pub fn dataset_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/datasets/:dataset",
            get(handlers::datasets::search_get).post(handlers::datasets::search_post),
        )
        .route("/datasets/:dataset/metadata", get(handlers::datasets::metadata))
        .route("/cache/invalidate", post(handlers::cache::invalidate))
        .route("/cache/stats", get(handlers::cache::stats))
}
