use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::extract_text_blocking;
use crate::models::submission::{NewSubmission, SubmissionResponse};
use crate::state::AppState;
use crate::submissions::validation::{
    validate_content_type, validate_job_description, validate_resume_text, validate_upload,
};

const DEFAULT_FILENAME: &str = "resume";

struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// The two form fields of a submission. Unknown fields are skipped.
struct SubmitForm {
    file: UploadedFile,
    job_description: String,
}

impl SubmitForm {
    async fn read(mut multipart: Multipart, limit: usize) -> Result<Self, AppError> {
        let malformed = |e: MultipartError| AppError::from_multipart(e, limit);
        let mut file = None;
        let mut job_description = None;

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    let filename = field.file_name().map(str::to_owned);
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field.bytes().await.map_err(malformed)?;
                    file = Some(UploadedFile {
                        filename,
                        content_type,
                        bytes,
                    });
                }
                Some("job_description") => {
                    job_description = Some(field.text().await.map_err(malformed)?)
                }
                _ => {}
            }
        }

        Ok(Self {
            file: file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?,
            job_description: job_description.ok_or_else(|| {
                AppError::Validation("Missing 'job_description' field".to_string())
            })?,
        })
    }
}

/// POST /api/v1/submit_resume
pub async fn handle_submit_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let SubmitForm {
        file,
        job_description,
    } = SubmitForm::read(multipart, state.max_upload_bytes).await?;

    let format = validate_content_type(file.content_type.as_deref())?;
    validate_job_description(&job_description)?;
    validate_upload(&file.bytes)?;

    let filename = file
        .filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    info!("Extracting text from file: {filename} ({})", format.label());
    let resume_text = extract_text_blocking(file.bytes, format).await?;
    validate_resume_text(&resume_text)?;

    info!("Starting resume analysis");
    let analysis = state
        .analyzer
        .analyze(&resume_text, &job_description)
        .await?;

    let stored = state
        .store
        .create(NewSubmission {
            filename,
            resume_text,
            job_description,
            score: Some(analysis.score),
            feedback: Some(analysis.feedback),
            matched_keywords: analysis.matched_keywords,
            missing_keywords: analysis.missing_keywords,
        })
        .await?;

    info!(
        "Successfully processed resume submission with ID: {}",
        stored.id
    );
    Ok(Json(stored.into()))
}

/// GET /api/v1/submissions/:id
pub async fn handle_get_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission = state.store.get(id).await?;
    Ok(Json(submission.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::extraction::fixtures::{docx_from_paragraphs, pdf_from_lines};
    use crate::extraction::{DOCX_MIME, PDF_MIME};
    use crate::llm_client::{
        stub, AnalysisClient, AnalysisError, AnalysisResult, FallbackKind, ResumeAnalyzer,
    };
    use crate::routes::build_router;
    use crate::state::AppState;
    use crate::store::MemorySubmissionStore;

    const BOUNDARY: &str = "ats-test-boundary";

    /// Returns a fixed result and counts calls.
    struct FixedAnalyzer {
        result: AnalysisResult,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResumeAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _: &str, _: &str) -> Result<AnalysisResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    struct BrokenAnalyzer;

    #[async_trait]
    impl ResumeAnalyzer for BrokenAnalyzer {
        async fn analyze(&self, _: &str, _: &str) -> Result<AnalysisResult, AnalysisError> {
            Err(AnalysisError::InvalidResponse("no choices".to_string()))
        }
    }

    fn fixed_analyzer() -> Arc<FixedAnalyzer> {
        Arc::new(FixedAnalyzer {
            result: AnalysisResult {
                score: 78.0,
                feedback: "Solid alignment on backend skills.".to_string(),
                matched_keywords: vec!["rust".into(), "postgres".into(), "axum".into()],
                missing_keywords: vec!["kubernetes".into(), "grpc".into()],
            },
            calls: AtomicUsize::new(0),
        })
    }

    /// Records the resume text it was asked to analyze.
    struct RecordingAnalyzer {
        inner: Arc<FixedAnalyzer>,
        resume_text: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ResumeAnalyzer for RecordingAnalyzer {
        async fn analyze(
            &self,
            resume_text: &str,
            job_description: &str,
        ) -> Result<AnalysisResult, AnalysisError> {
            *self.resume_text.lock().unwrap() = Some(resume_text.to_string());
            self.inner.analyze(resume_text, job_description).await
        }
    }

    fn app_with(analyzer: Arc<dyn ResumeAnalyzer>) -> Router {
        app_with_limit(analyzer, 1024 * 1024)
    }

    fn app_with_limit(analyzer: Arc<dyn ResumeAnalyzer>, max_upload_bytes: usize) -> Router {
        build_router(AppState {
            store: Arc::new(MemorySubmissionStore::new()),
            analyzer,
            max_upload_bytes,
        })
    }

    /// Text of exactly `len` characters with no surrounding whitespace.
    fn text_of_len(len: usize) -> String {
        "SeniorRustEngineer".chars().cycle().take(len).collect()
    }

    fn job_description() -> String {
        "We are hiring a backend engineer with Rust, Postgres and Axum experience.".to_string()
    }

    fn resume_docx() -> Vec<u8> {
        docx_from_paragraphs(&[
            "Jane Doe",
            "Senior Backend Engineer with eight years building distributed systems in Rust and Go.",
            "Built Axum services on Postgres serving forty thousand requests per second.",
        ])
    }

    fn submit_request(
        file: Option<(&str, &str, &[u8])>,
        job_description: Option<&str>,
    ) -> Request<Body> {
        let mut body = Vec::new();
        if let Some((filename, content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(jd) = job_description {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{jd}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/submit_resume")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_valid_docx_submission_returns_analysis() {
        let analyzer = fixed_analyzer();
        let app = app_with(analyzer.clone());
        let docx = resume_docx();

        let (status, body) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(job_description().as_str())),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["id"], 1);
        assert_eq!(body["score"], 78.0);
        assert_eq!(body["feedback"], "Solid alignment on backend skills.");
        assert_eq!(body["matched_keywords"], json!(["rust", "postgres", "axum"]));
        assert_eq!(body["missing_keywords"], json!(["kubernetes", "grpc"]));
        assert!(body["created_at"].is_string());
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_matches_creation_response() {
        let app = app_with(fixed_analyzer());
        let docx = resume_docx();

        let (_, created) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(job_description().as_str())),
        )
        .await;
        let (status, fetched) = send(&app, get_request("/api/v1/submissions/1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_unknown_submission_is_404() {
        let app = app_with(fixed_analyzer());
        let (status, body) = send(&app, get_request("/api/v1/submissions/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_plain_text_rejected_before_extraction() {
        let analyzer = fixed_analyzer();
        let app = app_with(analyzer.clone());

        let (status, body) = send(
            &app,
            submit_request(
                Some(("cv.txt", "text/plain", text_of_len(300).as_bytes())),
                Some(job_description().as_str()),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Unsupported file type"));
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_pdf_submission_returns_analysis() {
        let analyzer = Arc::new(RecordingAnalyzer {
            inner: fixed_analyzer(),
            resume_text: Mutex::new(None),
        });
        let app = app_with(analyzer.clone());
        let pdf = pdf_from_lines(&[
            "Jane Doe",
            "Senior Backend Engineer with eight years building distributed systems.",
            "Built Axum services on Postgres serving forty thousand requests per second.",
        ]);

        let (status, body) = send(
            &app,
            submit_request(
                Some(("cv.pdf", PDF_MIME, pdf.as_slice())),
                Some(job_description().as_str()),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["filename"], "cv.pdf");
        assert_eq!(body["score"], 78.0);
        let analyzed = analyzer.resume_text.lock().unwrap().clone().unwrap();
        assert!(analyzed.contains("Postgres"), "got: {analyzed:?}");
        assert_eq!(analyzed, analyzed.trim());
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_413() {
        let analyzer = fixed_analyzer();
        let app = app_with_limit(analyzer.clone(), 1024);
        let oversized = vec![b'%'; 4096];

        let (status, body) = send(
            &app,
            submit_request(
                Some(("cv.pdf", PDF_MIME, oversized.as_slice())),
                Some(job_description().as_str()),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert!(body["error"]["message"].as_str().unwrap().contains("1024"));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected_for_any_content_type() {
        let app = app_with(fixed_analyzer());
        for content_type in [PDF_MIME, DOCX_MIME, "text/plain"] {
            let (status, _) = send(
                &app,
                submit_request(Some(("cv", content_type, &b""[..])), Some(job_description().as_str())),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "content type {content_type}");
        }
    }

    #[tokio::test]
    async fn test_job_description_length_boundary() {
        let app = app_with(fixed_analyzer());
        let docx = resume_docx();

        let (status, _) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(text_of_len(49).as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(text_of_len(50).as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_resume_length_boundary() {
        let app = app_with(fixed_analyzer());

        let short = docx_from_paragraphs(&[text_of_len(99).as_str()]);
        let (status, body) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, short.as_slice())), Some(job_description().as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Resume text is too short"));

        let exact = docx_from_paragraphs(&[text_of_len(100).as_str()]);
        let (status, _) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, exact.as_slice())), Some(job_description().as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let app = app_with(fixed_analyzer());
        let docx = resume_docx();

        let (status, _) = send(&app, submit_request(None, Some(job_description().as_str()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_server_error() {
        let app = app_with(fixed_analyzer());
        let (status, body) = send(
            &app,
            submit_request(
                Some(("cv.pdf", PDF_MIME, &b"%PDF-1.4 truncated garbage"[..])),
                Some(job_description().as_str()),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
    }

    #[tokio::test]
    async fn test_analysis_hard_error_is_server_error() {
        let app = app_with(Arc::new(BrokenAnalyzer));
        let docx = resume_docx();
        let (status, body) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(job_description().as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("no choices"));
    }

    #[tokio::test]
    async fn test_unreachable_service_still_succeeds_with_fallback() {
        let client = AnalysisClient::new(&stub::config_for(
            "http://127.0.0.1:1/v1/chat/completions".to_string(),
        ))
        .unwrap();
        let app = app_with(Arc::new(client));
        let docx = resume_docx();

        let (status, body) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(job_description().as_str())),
        )
        .await;

        let fallback = AnalysisResult::fallback(FallbackKind::Unreachable);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 60.0);
        assert_eq!(body["feedback"], fallback.feedback.as_str());
        assert_eq!(body["matched_keywords"], json!(fallback.matched_keywords));
        assert_eq!(body["missing_keywords"], json!(fallback.missing_keywords));
    }

    #[tokio::test]
    async fn test_malformed_reply_still_succeeds_with_fallback() {
        let url = stub::spawn_endpoint(
            StatusCode::OK,
            stub::completion("I'd rate this resume about 80/100."),
        )
        .await;
        let client = AnalysisClient::new(&stub::config_for(url)).unwrap();
        let app = app_with(Arc::new(client));
        let docx = resume_docx();

        let (status, body) = send(
            &app,
            submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(job_description().as_str())),
        )
        .await;

        let fallback = AnalysisResult::fallback(FallbackKind::Unparseable);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 65.0);
        assert_eq!(body["feedback"], fallback.feedback.as_str());
        assert_eq!(body["matched_keywords"], json!(fallback.matched_keywords));
    }

    #[tokio::test]
    async fn test_out_of_range_scores_clamped_end_to_end() {
        for (raw, expected) in [(150, 100.0), (-10, 0.0)] {
            let content = json!({
                "score": raw,
                "feedback": "Scored.",
                "matched_keywords": ["rust"],
                "missing_keywords": []
            })
            .to_string();
            let url = stub::spawn_endpoint(StatusCode::OK, stub::completion(&content)).await;
            let client = AnalysisClient::new(&stub::config_for(url)).unwrap();
            let app = app_with(Arc::new(client));
            let docx = resume_docx();

            let (status, created) = send(
                &app,
                submit_request(Some(("cv.docx", DOCX_MIME, docx.as_slice())), Some(job_description().as_str())),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(created["score"], expected);

            let (_, fetched) = send(&app, get_request("/api/v1/submissions/1")).await;
            assert_eq!(fetched["score"], expected);
        }
    }
}
