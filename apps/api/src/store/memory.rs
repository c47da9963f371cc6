use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{normalize_score, StoreError, SubmissionStore};
use crate::models::submission::{NewSubmission, Submission};

/// In-process store. Ids start at 1 and follow insertion order; contents are lost on exit.
#[derive(Default)]
pub struct MemorySubmissionStore {
    rows: RwLock<Vec<Submission>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let mut rows = self.rows.write().await;
        let stored = Submission {
            id: rows.len() as i64 + 1,
            filename: submission.filename,
            resume_text: submission.resume_text,
            job_description: submission.job_description,
            score: normalize_score(submission.score),
            feedback: submission.feedback,
            matched_keywords: submission.matched_keywords,
            missing_keywords: submission.missing_keywords,
            created_at: Utc::now(),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Submission, StoreError> {
        let index = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .ok_or(StoreError::NotFound(id))?;
        self.rows
            .read()
            .await
            .get(index)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
