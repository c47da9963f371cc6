//! Submission Store: append-only persistence of analysis attempts.
//!
//! Two backends: `PgSubmissionStore` (sqlx / Postgres) for deployments and
//! `MemorySubmissionStore` for development runs without `DATABASE_URL` and for tests.
//! Neither exposes update or delete.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::submission::{NewSubmission, Submission};

mod memory;
mod postgres;

pub use memory::MemorySubmissionStore;
pub use postgres::PgSubmissionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Submission {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Assigns `id` and `created_at`, persists, and returns the stored record.
    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError>;

    async fn get(&self, id: i64) -> Result<Submission, StoreError>;
}

/// Keeps a persisted score inside 0..=100; non-finite scores are stored as absent.
fn normalize_score(score: Option<f64>) -> Option<f64> {
    score
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, 100.0))
}
