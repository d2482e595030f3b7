//! Generative-text service.
//!
//! This module provides:
//! - `TextGenerator`: the prompt-in, text-out seam every agent and tool uses
//! - `GeminiClient`: a blocking client for the Gemini `generateContent` endpoint

use crate::config::Settings;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Gemini API base URL
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("salesiq/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while generating text.
#[derive(Debug, Error)]
pub enum GenerativeError {
    /// API key rejected (400 API_KEY_INVALID, 401 or 403)
    #[error("Invalid API key: the generative service rejected the credentials")]
    InvalidKey,

    /// Quota or rate limit exhausted (429)
    #[error("Quota exceeded: the generative service is rate limiting requests")]
    QuotaExceeded,

    /// Any other non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// The response carried no text
    #[error("The generative service returned an empty response")]
    EmptyResponse,

    /// Failed to parse response
    #[error("Failed to parse generative service response: {0}")]
    Parse(String),
}

/// Anything that turns a prompt into text.
pub trait TextGenerator {
    /// Generate a completion for `prompt`.
    fn generate(&self, prompt: &str) -> Result<String, GenerativeError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<String, GenerativeError> {
        (**self).generate(prompt)
    }
}

/// Response from `generateContent` (only fields we care about).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Blocking Gemini client.
pub struct GeminiClient {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client from resolved settings.
    pub fn new(settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs.value))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            api_key: settings.api_key.clone(),
            model: settings.model.value.clone(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Model this client generates with.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerativeError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .agent
            .post(&url)
            .query("key", &self.api_key)
            .set("Content-Type", "application/json")
            .send_json(body);

        match response {
            Ok(resp) => {
                let body = resp
                    .into_string()
                    .map_err(|e| GenerativeError::Network(e.to_string()))?;
                parse_generate_response(&body)
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(classify_status(status, body))
            }
            Err(e) => Err(GenerativeError::Network(e.to_string())),
        }
    }
}

fn classify_status(status: u16, body: String) -> GenerativeError {
    match status {
        400 if body.contains("API_KEY_INVALID") => GenerativeError::InvalidKey,
        401 | 403 => GenerativeError::InvalidKey,
        429 => GenerativeError::QuotaExceeded,
        _ => GenerativeError::Http { status, body },
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_generate_response(body: &str) -> Result<String, GenerativeError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerativeError::Parse(e.to_string()))?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerativeError::EmptyResponse);
    }
    Ok(text)
}
