pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::import::handlers as import;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Prospect import
        .route(
            "/api/v1/prospects/import/upload",
            post(import::handle_upload),
        )
        .route(
            "/api/v1/prospects/import/preview",
            post(import::handle_preview),
        )
        .route("/api/v1/prospects/import", post(import::handle_import))
        .route(
            "/api/v1/prospects/import/fields",
            get(import::handle_import_fields),
        )
        .route(
            "/api/v1/prospects/import/:import_id/cancel",
            post(import::handle_cancel_import),
        )
        .route(
            "/api/v1/prospects/events",
            get(import::handle_prospect_events),
        )
        // Skill matching
        .route("/api/v1/matching/skills", post(matching::handle_skill_match))
        .route("/api/v1/matching/compare", post(matching::handle_compare))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
