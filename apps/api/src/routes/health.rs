use axum::Json;
use serde_json::{json, Value};

/// GET /api/v1/health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "ATS Resume Checker API is running"
    }))
}

/// GET /
/// Service banner with version and the health endpoint path.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "ATS Resume Checker API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/v1/health"
    }))
}
