use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const CREATE_SUBMISSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS resume_submissions (
    id               BIGSERIAL PRIMARY KEY,
    filename         TEXT NOT NULL,
    resume_text      TEXT NOT NULL,
    job_description  TEXT NOT NULL,
    score            DOUBLE PRECISION CHECK (score >= 0 AND score <= 100),
    feedback         TEXT,
    matched_keywords TEXT[] NOT NULL DEFAULT '{}',
    missing_keywords TEXT[] NOT NULL DEFAULT '{}',
    created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the submissions table if it does not exist yet. Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_SUBMISSIONS_TABLE)
        .execute(pool)
        .await
        .context("Failed to create resume_submissions table")?;

    info!("Schema ready: resume_submissions");
    Ok(())
}
