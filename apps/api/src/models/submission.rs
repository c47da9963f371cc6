use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One persisted resume + job description analysis. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i64,
    pub filename: String,
    pub resume_text: String,
    pub job_description: String,
    /// 0..=100 when present.
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub filename: String,
    pub resume_text: String,
    pub job_description: String,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

/// Public shape of a submission returned by both the submit and lookup endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: i64,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            score: s.score,
            feedback: s.feedback,
            matched_keywords: s.matched_keywords,
            missing_keywords: s.missing_keywords,
            created_at: s.created_at,
        }
    }
}
