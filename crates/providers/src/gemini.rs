//! Google Gemini generation engine.
//!
//! Talks to the Generative Language REST API:
//! - `models/{model}:generateContent` for complete responses
//! - `models/{model}:streamGenerateContent?alt=sse` for fragment streaming
//!
//! The prompt arrives fully composed, so every request carries exactly one
//! user content part.

use async_trait::async_trait;
use aurion_core::engine::{FragmentReceiver, GenerationEngine};
use aurion_core::error::GenerationError;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Default public endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini-backed [`GenerationEngine`].
pub struct GeminiEngine {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
    client: reqwest::Client,
}

impl GeminiEngine {
    /// Create an engine for `model` using the default endpoint and a 120s timeout.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        Self::with_timeout(api_key, model, std::time::Duration::from_secs(120))
    }

    /// Create an engine with a custom HTTP request timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                GenerationError::NotConfigured(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_output_tokens: None,
            client,
        })
    }

    /// Point at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    fn request_body(&self, prompt: &str) -> ApiRequest {
        ApiRequest {
            contents: vec![ApiContent {
                role: Some("user".into()),
                parts: vec![ApiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: ApiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    /// Map a non-success HTTP status to an error.
    async fn status_error(response: reqwest::Response) -> GenerationError {
        let status = response.status().as_u16();
        match status {
            429 => GenerationError::RateLimited {
                retry_after_secs: 5,
            },
            401 | 403 => GenerationError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ),
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                warn!(status, body = %error_body, "Gemini returned error");
                GenerationError::Api {
                    status_code: status,
                    message: extract_error_message(&error_body),
                }
            }
        }
    }
}

#[async_trait]
impl GenerationEngine for GeminiEngine {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| GenerationError::Api {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        match api_response.text() {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(GenerationError::EmptyResponse),
        }
    }

    async fn generate_stream(&self, prompt: &str) -> Result<FragmentReceiver, GenerationError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending streaming request");

        let response = self
            .client
            .post(format!("{}?alt=sse", self.endpoint("streamGenerateContent")))
            .header("x-goog-api-key", &self.api_key)
            .header("Accept", "text/event-stream")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        // Capacity 1: the reader stays at most one fragment ahead of the consumer.
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = SseBuffer::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(GenerationError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for data in buffer.push_bytes(&bytes) {
                    let Some(fragment) = parse_sse_data(&data) else {
                        continue;
                    };
                    if tx.send(fragment).await.is_err() {
                        debug!("Fragment consumer went away, stopping stream");
                        return;
                    }
                }
            }

            // A trailing event without a final blank line
            if let Some(data) = buffer.finish() {
                if let Some(fragment) = parse_sse_data(&data) {
                    let _ = tx.send(fragment).await;
                }
            }
        });

        Ok(rx)
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models/{}", self.base_url, self.model);
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Gemini health check failed");
                false
            }
        }
    }
}

/// Turn one SSE `data:` payload into a fragment.
///
/// Payloads without text (e.g. a final usage-only event) yield `None`; a
/// payload carrying an API error yields that error.
fn parse_sse_data(data: &str) -> Option<Result<String, GenerationError>> {
    match serde_json::from_str::<ApiResponse>(data) {
        Ok(resp) => {
            if let Some(err) = resp.error {
                return Some(Err(GenerationError::Api {
                    status_code: err.code.unwrap_or(500),
                    message: err.message.unwrap_or_default(),
                }));
            }
            resp.text().filter(|t| !t.is_empty()).map(Ok)
        }
        Err(e) => {
            trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
            None
        }
    }
}

/// Pull `message` out of a Google error envelope, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ApiResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string())
}

/// Line buffer for an SSE byte stream that may split anywhere.
#[derive(Default)]
struct SseBuffer {
    /// Bytes of a UTF-8 sequence split across chunks
    raw: Vec<u8>,
    pending: String,
    data: Vec<String>,
}

impl SseBuffer {
    fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        self.raw.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.raw) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            // Invalid rather than incomplete: decode lossily and move on.
            Err(_) => self.raw.len(),
        };
        let text = String::from_utf8_lossy(&self.raw[..valid]).into_owned();
        self.raw.drain(..valid);
        self.push(&text)
    }

    /// Feed text; returns the data payloads of every event completed by it.
    fn push(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);
        let mut events = Vec::new();

        while let Some(line_end) = self.pending.find('\n') {
            let line = self.pending[..line_end].trim_end_matches('\r').to_string();
            self.pending.drain(..=line_end);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }

            // Skip SSE comments
            if line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                self.data.push(data.trim_start().to_string());
            }
        }

        events
    }

    fn finish(&mut self) -> Option<String> {
        if !self.pending.trim().is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.push(&format!("{rest}\n"));
        }
        if self.data.is_empty() {
            None
        } else {
            let event = self.data.join("\n");
            self.data.clear();
            Some(event)
        }
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

impl ApiResponse {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        Some(
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> GeminiEngine {
        GeminiEngine::new("AIza-test", "gemini-2.5-flash").unwrap()
    }

    #[test]
    fn endpoints_include_model_and_method() {
        let e = engine().with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            e.endpoint("generateContent"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(e.name(), "gemini");
        assert_eq!(e.model(), "gemini-2.5-flash");
    }

    #[test]
    fn request_body_wire_format() {
        let e = engine().with_temperature(0.2).with_max_output_tokens(256);
        let body = serde_json::to_value(e.request_body("User: hi\n\nAssistant:")).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "User: hi\n\nAssistant:");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn request_body_omits_unset_token_limit() {
        let body = serde_json::to_value(engine().request_body("x")).unwrap();
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn parse_complete_response_joins_parts() {
        let data = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Hello, world"));
    }

    #[test]
    fn parse_blocked_response_has_no_text() {
        let data = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.text().is_none());

        let empty: ApiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn sse_data_with_text_is_a_fragment() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"chunk"}],"role":"model"}}]}"#;
        assert_eq!(parse_sse_data(data).unwrap().unwrap(), "chunk");
    }

    #[test]
    fn sse_data_without_text_is_skipped() {
        let data = r#"{"candidates":[{"content":{"parts":[],"role":"model"},"finishReason":"STOP"}]}"#;
        assert!(parse_sse_data(data).is_none());
        assert!(parse_sse_data("not json").is_none());
    }

    #[test]
    fn sse_error_payload_becomes_error() {
        let data = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        match parse_sse_data(data).unwrap() {
            Err(GenerationError::Api { status_code, message }) => {
                assert_eq!(status_code, 503);
                assert!(message.contains("overloaded"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(extract_error_message(body), "API key not valid.");
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn sse_buffer_handles_split_events() {
        let mut buf = SseBuffer::default();
        assert!(buf.push("data: {\"a\"").is_empty());
        assert!(buf.push(":1}\r\n").is_empty());
        let events = buf.push("\r\ndata: second\n\n: keep-alive\n");
        assert_eq!(events, vec![r#"{"a":1}"#.to_string(), "second".to_string()]);
        assert!(buf.finish().is_none());
    }

    #[test]
    fn sse_buffer_joins_split_utf8() {
        let mut buf = SseBuffer::default();
        let bytes = "data: caf\u{e9}\n\n".as_bytes();
        let split = bytes.len() - 3;
        assert!(buf.push_bytes(&bytes[..split]).is_empty());
        assert_eq!(buf.push_bytes(&bytes[split..]), vec!["caf\u{e9}".to_string()]);
    }

    #[test]
    fn sse_buffer_flushes_unterminated_tail() {
        let mut buf = SseBuffer::default();
        assert!(buf.push("data: tail").is_empty());
        assert_eq!(buf.finish().as_deref(), Some("tail"));
    }
}
