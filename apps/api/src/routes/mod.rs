pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::submissions::handlers;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/api/v1/health", get(health::health_handler))
        .route(
            "/api/v1/submit_resume",
            post(handlers::handle_submit_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/submissions/:id",
            get(handlers::handle_get_submission),
        )
        .with_state(state)
}
