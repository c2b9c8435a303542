use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::RawModelReply,
};

static RETRY_DELAY_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)retryDelay"\s*:\s*"(\d+(?:\.\d+)?)s""#)
        .expect("RETRY_DELAY_FIELD is a valid regex pattern")
});

static RETRY_IN_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Please retry in\s+(\d+(?:\.\d+)?)s")
        .expect("RETRY_IN_PHRASE is a valid regex pattern")
});

/// Failure reported by a text provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Single-shot text completion: one instruction in, one reply out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Sends built prompts to a provider and classifies its failures.
/// Never retries; the caller decides what to do with the retry hint.
pub struct GenerationClient {
    provider: Arc<dyn TextProvider>,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, instruction: &str) -> AppResult<RawModelReply> {
        match self.provider.complete(instruction).await {
            Ok(text) => Ok(RawModelReply::new(text)),
            Err(err) => {
                let retry_after_seconds = extract_retry_seconds(&err.message);
                let status_code = err.status.unwrap_or(500);
                log::error!(
                    "Provider call failed (status {}, retry hint {:?}): {}",
                    status_code,
                    retry_after_seconds,
                    err.message
                );
                Err(AppError::ExternalService {
                    status_code,
                    message: err.message,
                    retry_after_seconds,
                })
            }
        }
    }
}

/// Finds a retry delay in a provider error message: first a structured
/// `retryDelay":"Ns"` field, then a "Please retry in N.Ns" phrase.
/// Fractional seconds are rounded up.
pub fn extract_retry_seconds(message: &str) -> Option<u64> {
    [&*RETRY_DELAY_FIELD, &*RETRY_IN_PHRASE]
        .iter()
        .find_map(|pattern| {
            pattern
                .captures(message)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        })
        .map(|seconds| seconds.ceil() as u64)
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` over REST.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| AppError::Configuration("Missing GEMINI_API_KEY".to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = GeminiRequest {
            contents: [GeminiContent {
                parts: [GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::new(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::new(
                Some(status.as_u16()),
                format!("[{}] {}", status, text),
            ));
        }

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::new(None, format!("Unreadable provider response: {}", e)))?;

        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(ProviderError::new(None, "Provider returned no text"));
        }

        Ok(reply)
    }
}
