use std::sync::Arc;

use crate::llm_client::ResumeAnalyzer;
use crate::store::SubmissionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in deployments, memory store in development and tests.
    pub store: Arc<dyn SubmissionStore>,
    pub analyzer: Arc<dyn ResumeAnalyzer>,
    pub max_upload_bytes: usize,
}
