//! Gemini `generateContent` client

use super::config::GeminiConfig;
use crate::{CatMiniError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Something that turns a question into an answer
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// HTTP client for Gemini
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CatMiniError::ConfigError("Gemini API key is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatMiniError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        info!("Gemini client ready (model: {})", config.model);

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, question: &str) -> Result<String> {
        let start = Instant::now();
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: question }],
            }],
        };

        let response = self
            .client
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CatMiniError::GenerationError(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CatMiniError::GenerationError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(CatMiniError::GenerationError(format!(
                "Gemini API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let answer = parse_answer(&body)?;
        debug!(
            "Gemini answered {} chars in {}ms",
            answer.len(),
            start.elapsed().as_millis()
        );
        Ok(answer)
    }
}

/// Extract the answer text from a successful response body
fn parse_answer(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| CatMiniError::GenerationError(format!("Malformed response: {}", e)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CatMiniError::GenerationError(format!(
            "Prompt blocked: {}",
            reason
        )));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(CatMiniError::GenerationError("No candidates returned".into()));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CatMiniError::GenerationError(format!(
            "Empty answer (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}
