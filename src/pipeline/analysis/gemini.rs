use std::sync::Mutex;
use std::time::Duration;

use super::gemini_types::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use super::types::{PromptPayload, ReasoningClient};
use super::AnalysisError;

/// Gemini HTTP client for multimodal `generateContent` calls.
///
/// Built once at startup and shared read-only across requests.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Fails with `ConfigurationMissing` when the key is blank.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AnalysisError::ConfigurationMissing);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::AnalysisFailed(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl ReasoningClient for GeminiClient {
    fn generate(&self, model: &str, payload: &PromptPayload) -> Result<String, AnalysisError> {
        let url = self.endpoint(model);
        let body = GenerateContentRequest::from_payload(payload);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::AnalysisFailed(format!(
                        "Request timed out after {}s: {e}",
                        self.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    AnalysisError::AnalysisFailed(format!("Cannot reach {}: {e}", self.base_url))
                } else {
                    AnalysisError::AnalysisFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::AnalysisFailed(describe_api_error(
                status.as_u16(),
                &body,
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| AnalysisError::AnalysisFailed(format!("Unreadable Gemini response: {e}")))?;

        extract_text(&parsed)
    }
}

/// Pull the completion text out of a successful response.
fn extract_text(response: &GenerateContentResponse) -> Result<String, AnalysisError> {
    if let Some(reason) = response.block_reason() {
        return Err(AnalysisError::AnalysisFailed(format!(
            "Prompt blocked by Gemini: {reason}"
        )));
    }
    response.first_candidate_text().ok_or_else(|| {
        AnalysisError::AnalysisFailed(match response.finish_reason() {
            Some(reason) => format!("Gemini returned no text (finish reason {reason})"),
            None => "Gemini returned no candidates".to_string(),
        })
    })
}

/// Prefer the API's own error message over the raw body.
fn describe_api_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("Gemini error {status} ({code}): {}", envelope.error.message),
            None => format!("Gemini error {status}: {}", envelope.error.message),
        },
        Err(_) => format!("Gemini error {status}: {}", body.trim()),
    }
}

/// Mock reasoning client for testing. Returns a configurable response
/// and records every payload it receives.
pub struct MockReasoningClient {
    response: Result<String, String>,
    calls: Mutex<Vec<(String, PromptPayload)>>,
}

impl MockReasoningClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `AnalysisFailed(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// (model, payload) of every call so far.
    pub fn calls(&self) -> Vec<(String, PromptPayload)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ReasoningClient for MockReasoningClient {
    fn generate(&self, model: &str, payload: &PromptPayload) -> Result<String, AnalysisError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((model.to_string(), payload.clone()));
        }
        self.response
            .clone()
            .map_err(AnalysisError::AnalysisFailed)
    }
}
