//! Gemini API client
//!
//! Speaks the hosted `generateContent` REST API, with a streaming variant
//! that parses Server-Sent Events into text fragments.

use crate::conversation::{Message, Sender};
use crate::llm::config::LlmConfig;
use crate::{AuraError, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

/// Generates assistant replies for user prompts.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate a complete reply for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a reply as a lazy, finite, non-restartable stream of text
    /// fragments.
    fn generate_stream(&self, prompt: &str) -> BoxStream<'static, Result<String>>;
}

/// Hosted LLM client over the Gemini REST API.
pub struct GeminiClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        config.validate().map_err(AuraError::Config)?;

        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AuraError::Config(format!("Failed to build HTTP client: {e}")))?;

        debug!("Gemini client configured: model={}", config.model);
        Ok(Self { config, http })
    }

    fn endpoint(&self, action: &str) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        format!("{}/models/{}:{}", base, self.config.model, action)
    }
}

#[async_trait]
impl ResponseGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}?key={}", self.endpoint("generateContent"), self.config.api_key);
        let body = build_request_body(prompt, &self.config);

        debug!("Requesting completion from {}", self.config.model);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| AuraError::Generation(format!("API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuraError::Generation(format!(
                "API returned HTTP {}: {}",
                status.as_u16(),
                extract_error_message(&text)
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AuraError::Generation(format!("Malformed API response: {e}")))?;

        extract_reply_text(&json)
    }

    fn generate_stream(&self, prompt: &str) -> BoxStream<'static, Result<String>> {
        let url = format!(
            "{}?alt=sse&key={}",
            self.endpoint("streamGenerateContent"),
            self.config.api_key
        );
        let body = build_request_body(prompt, &self.config);
        let http = self.http.clone();

        let stream = async_stream::stream! {
            let response = match http.post(&url).json(&body).send().await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(AuraError::Generation(format!("API request failed: {e}")));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                yield Err(AuraError::Generation(format!(
                    "API returned HTTP {}: {}",
                    status.as_u16(),
                    extract_error_message(&text)
                )));
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut buffer = SseLineBuffer::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(AuraError::Generation(format!("Stream read failed: {e}")));
                        return;
                    }
                };

                for payload in buffer.push(&chunk) {
                    match serde_json::from_str::<Value>(&payload) {
                        Ok(json) => {
                            if let Ok(text) = extract_reply_text(&json) {
                                yield Ok(text);
                            }
                        }
                        Err(e) => {
                            yield Err(AuraError::Generation(format!(
                                "Malformed stream chunk: {e}"
                            )));
                            return;
                        }
                    }
                }
            }
        };

        Box::pin(stream)
    }
}

/// Fold prior transcript turns into a role-prefixed prompt.
///
/// In-flight placeholders and empty entries are skipped.
pub fn format_context_prompt(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        if message.is_typing || message.text.is_empty() {
            continue;
        }
        let role = match message.sender {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        };
        prompt.push_str(role);
        prompt.push_str(": ");
        prompt.push_str(&message.text);
        prompt.push('\n');
    }
    prompt.trim_end().to_owned()
}

fn build_request_body(prompt: &str, config: &LlmConfig) -> Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "maxOutputTokens": config.max_tokens,
            "temperature": config.temperature,
        },
    })
}

/// Concatenate the text parts of the first candidate.
fn extract_reply_text(body: &Value) -> Result<String> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| AuraError::Generation("Response contained no candidates".to_string()))?;

    let mut text = String::new();
    for part in parts {
        if let Some(fragment) = part["text"].as_str() {
            text.push_str(fragment);
        }
    }

    if text.is_empty() {
        return Err(AuraError::Generation("Response contained no text".to_string()));
    }
    Ok(text)
}

/// Pull the service's error message out of an error response body, falling
/// back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_owned())
}

/// Incremental buffer over SSE bytes, yielding complete `data:` payloads.
struct SseLineBuffer {
    pending: String,
}

impl SseLineBuffer {
    fn new() -> Self {
        Self {
            pending: String::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end();
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() && data != "[DONE]" {
                    payloads.push(data.to_owned());
                }
            }
        }
        payloads
    }
}
