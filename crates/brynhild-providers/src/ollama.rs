//! An Ollama provider. Ollama streams newline-delimited JSON objects
//! (not SSE) and has no native tool-calling protocol at the wire level.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use serde_json::{json, Value};

use crate::error::{ProviderError, Result};
use crate::provider::{EventStream, Provider};
use crate::reasoning::ollama_think_value;
use crate::types::{ChatRequest, Message, Role, StreamEvent, Usage};

const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    http: reqwest::Client,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self::with_base_url(OLLAMA_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()
                .expect("reqwest client construction cannot fail with no custom TLS config"),
        }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn provider_type(&self) -> &'static str {
        "ollama"
    }

    fn supports_tools(&self) -> bool {
        false
    }

    async fn stream(&self, request: ChatRequest) -> Result<EventStream> {
        let mut body = json!({
            "model": request.model,
            "messages": to_wire_messages(&request.messages),
            "stream": true,
        });
        if let Some(think) = ollama_think_value(&request.model, &request.reasoning) {
            body["think"] = think;
        }

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Http { provider: "ollama".into(), source })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                provider: "ollama".into(),
                status: status.as_u16(),
                body: text,
            });
        }

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut byte_stream = resp.bytes_stream();
            let mut line_buffer = String::new();
            let mut usage = Usage::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::Http { provider: "ollama".into(), source: e }));
                        return;
                    }
                };
                line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = line_buffer.find('\n') {
                    let line = line_buffer[..pos].trim().to_string();
                    line_buffer = line_buffer[pos + 1..].to_string();
                    if line.is_empty() {
                        continue;
                    }

                    let v: Value = match serde_json::from_str(&line) {
                        Ok(v) => v,
                        Err(e) => {
                            let _ = tx.send(Err(ProviderError::ParseFailed {
                                provider: "ollama".into(),
                                reason: format!("invalid NDJSON line: {e}"),
                            }));
                            return;
                        }
                    };

                    if let Some(thinking) = v["message"]["thinking"].as_str() {
                        if !thinking.is_empty()
                            && tx
                                .send(Ok(StreamEvent::ThinkingDelta { index: 0, text: thinking.to_string() }))
                                .is_err()
                        {
                            return;
                        }
                    }

                    if let Some(content) = v["message"]["content"].as_str() {
                        if !content.is_empty()
                            && tx
                                .send(Ok(StreamEvent::TextDelta { index: 0, text: content.to_string() }))
                                .is_err()
                        {
                            return;
                        }
                    }

                    if let Some(count) = v["prompt_eval_count"].as_u64() {
                        usage.input_tokens = count as u32;
                    }
                    if let Some(count) = v["eval_count"].as_u64() {
                        usage.output_tokens = count as u32;
                    }

                    if v["done"].as_bool() == Some(true) {
                        let _ = tx.send(Ok(StreamEvent::MessageStop { stop_reason: None, usage }));
                        return;
                    }
                }
            }
        });

        let stream = stream::poll_fn(move |cx| rx.poll_recv(cx));
        Ok(Box::pin(stream))
    }
}

fn to_wire_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m.role {
            Role::System => Some(json!({ "role": "system", "content": m.content })),
            Role::User => Some(json!({ "role": "user", "content": m.content })),
            Role::Assistant => Some(json!({ "role": "assistant", "content": m.content })),
            // Ollama has no native tool-result role; fold it into a user turn.
            Role::Tool => Some(json!({ "role": "user", "content": m.content })),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_claim_tool_support() {
        assert!(!OllamaProvider::new().supports_tools());
    }
}
