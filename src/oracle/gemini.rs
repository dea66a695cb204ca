//! HTTP client for the Google generative-language REST endpoint.

use crate::errors::OracleError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::NarrativeOracle;

/// Reasoning-grade model used for audit rounds.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-request timeout. Timeouts belong to this call boundary, not to the
/// orchestration engine above it.
const DEFAULT_TIMEOUT_SECS: u64 = 240;

/// Oracle backed by the generative-language `generateContent` endpoint.
pub struct GeminiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiOracle {
    /// Build from the environment: `GEMINI_API_KEY`, falling back to
    /// `API_KEY`. Fails with [`OracleError::MissingCredential`] when
    /// neither is set; callers surface that before any round runs.
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(OracleError::MissingCredential)?;
        Ok(Self::new(api_key, DEFAULT_MODEL))
    }

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different endpoint base (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        )
    }
}

#[async_trait]
impl NarrativeOracle for GeminiOracle {
    async fn generate(&self, instruction: &str, seed: i64) -> Result<String, OracleError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: instruction.to_string(),
                }],
            }],
            generation_config: GenerationConfig { seed },
        };

        let response = self
            .http
            .post(self.request_url())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(text)
    }

    fn model_tag(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    seed: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
