use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::{normalize_score, StoreError, SubmissionStore};
use crate::models::submission::{NewSubmission, Submission};

/// Postgres-backed store. Each call borrows a pooled connection for one statement;
/// the connection returns to the pool on drop, error paths included.
#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        // Single-row INSERT; ids and timestamps come from the database.
        let stored: Submission = sqlx::query_as(
            r#"
            INSERT INTO resume_submissions
                (filename, resume_text, job_description, score, feedback,
                 matched_keywords, missing_keywords)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&submission.filename)
        .bind(&submission.resume_text)
        .bind(&submission.job_description)
        .bind(normalize_score(submission.score))
        .bind(&submission.feedback)
        .bind(&submission.matched_keywords)
        .bind(&submission.missing_keywords)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted resume submission {}", stored.id);
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Submission, StoreError> {
        sqlx::query_as::<_, Submission>("SELECT * FROM resume_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }
}
