//! Analysis Client: the single point of entry for calls to the completion endpoint.
//!
//! The endpoint speaks the chat-completions dialect: a `choices` array whose first
//! message carries the analysis JSON as a string. Transport failures and unparseable
//! replies degrade to fixed fallback results; only a structurally invalid completion
//! envelope is reported as an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;

pub mod prompts;

/// Model requested for every analysis.
pub const MODEL: &str = "anthropic/claude-3.5-sonnet";
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const REQUIRED_KEYS: [&str; 4] = ["score", "feedback", "matched_keywords", "missing_keywords"];

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid response structure from AI API: {0}")]
    InvalidResponse(String),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Structured outcome of comparing a resume with a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Always within 0..=100.
    pub score: f64,
    pub feedback: String,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

/// Which recovery path produced a fallback result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// Network error, timeout, non-2xx status, or a non-JSON response body.
    Unreachable,
    /// The service replied but its message content was not a usable analysis.
    Unparseable,
}

impl AnalysisResult {
    pub fn fallback(kind: FallbackKind) -> Self {
        match kind {
            FallbackKind::Unreachable => Self {
                score: 60.0,
                feedback: "Resume analysis completed with limited connectivity. Basic compatibility detected. Please ensure your resume includes relevant keywords from the job description and highlights your most relevant experience.".to_string(),
                matched_keywords: vec!["work experience".to_string(), "education".to_string()],
                missing_keywords: vec![
                    "job-specific keywords".to_string(),
                    "technical skills".to_string(),
                ],
            },
            FallbackKind::Unparseable => Self {
                score: 65.0,
                feedback: "Resume analysis completed. The system detected moderate compatibility with the job description. Consider adding more relevant keywords and skills mentioned in the job posting.".to_string(),
                matched_keywords: vec![
                    "experience".to_string(),
                    "skills".to_string(),
                    "education".to_string(),
                ],
                missing_keywords: vec![
                    "specific technical skills".to_string(),
                    "industry keywords".to_string(),
                ],
            },
        }
    }
}

/// Scores a resume against a job description.
///
/// Carried in `AppState` as `Arc<dyn ResumeAnalyzer>`.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, AnalysisError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl CompletionResponse {
    fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

/// reqwest-backed client for the completion endpoint. Built once at startup.
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl AnalysisClient {
    pub fn new(config: &Config) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_url: config.analysis_api_url.clone(),
            api_key: config.analysis_api_key.clone(),
        })
    }

    /// One round-trip, no retries. Any error here is a transport failure.
    async fn request_completion(&self, user_message: &str) -> Result<Value, reqwest::Error> {
        let body = CompletionRequest {
            model: MODEL,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: prompts::ATS_ANALYSIS_SYSTEM,
                },
                CompletionMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

#[async_trait]
impl ResumeAnalyzer for AnalysisClient {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("Requesting resume analysis (model: {MODEL})");
        let user_message = prompts::build_analysis_message(resume_text, job_description);

        let completion = match self.request_completion(&user_message).await {
            Ok(completion) => completion,
            Err(e) => {
                error!("Error calling analysis endpoint: {e}");
                let result = AnalysisResult::fallback(FallbackKind::Unreachable);
                warn!("Using connectivity fallback with score: {}", result.score);
                return Ok(result);
            }
        };

        let result = interpret_completion(completion)?;
        info!("Resume analysis completed with score: {}", result.score);
        Ok(result)
    }
}

/// Validates a completion envelope and turns its message content into an analysis.
fn interpret_completion(completion: Value) -> Result<AnalysisResult, AnalysisError> {
    let response: CompletionResponse = serde_json::from_value(completion)
        .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;
    let content = response
        .text()
        .ok_or_else(|| AnalysisError::InvalidResponse("no message content in choices".into()))?;

    match parse_analysis(content) {
        Ok(result) => Ok(result),
        Err(reason) => {
            error!("Error parsing AI response: {reason}");
            Ok(AnalysisResult::fallback(FallbackKind::Unparseable))
        }
    }
}

fn parse_analysis(content: &str) -> Result<AnalysisResult, String> {
    let value: Value =
        serde_json::from_str(strip_json_fences(content)).map_err(|e| e.to_string())?;
    let fields = value.as_object().ok_or("analysis is not a JSON object")?;

    if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !fields.contains_key(**k)) {
        return Err(format!("missing required key '{missing}'"));
    }

    let score = coerce_score(&fields["score"])
        .ok_or_else(|| format!("score is not numeric: {}", fields["score"]))?;
    let feedback = fields["feedback"]
        .as_str()
        .ok_or("feedback is not a string")?
        .to_string();

    Ok(AnalysisResult {
        score: score.clamp(0.0, 100.0),
        feedback,
        matched_keywords: keyword_list(&fields["matched_keywords"]),
        missing_keywords: keyword_list(&fields["missing_keywords"]),
    })
}

/// Numbers and numeric strings are accepted; anything non-finite is not.
fn coerce_score(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Non-list values collapse to an empty list; non-string items are dropped.
fn keyword_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
