//! An OpenAI Chat Completions-compatible provider. Used directly for
//! OpenAI, and for any self-hosted or third-party backend that speaks the
//! same wire format (vLLM, Azure OpenAI, OpenRouter, ...) by pointing
//! `base_url` elsewhere.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use serde_json::{json, Value};

use crate::error::{ProviderError, Result};
use crate::provider::{EventStream, Provider};
use crate::reasoning::openai_reasoning_effort;
use crate::types::{ChatRequest, Message, Role, StreamEvent, ToolDefinition, Usage};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, OPENAI_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("reqwest client construction cannot fail with no custom TLS config"),
        }
    }

    fn build_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": to_wire_messages(&request.messages),
            "stream": true,
            "stream_options": { "include_usage": true },
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_completion_tokens"] = json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }
        if !request.tools.is_empty() {
            body["tools"] = json!(build_tools_payload(&request.tools));
        }
        if let Some(effort) = openai_reasoning_effort(&request.reasoning) {
            body["reasoning_effort"] = json!(effort);
        }

        body
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn provider_type(&self) -> &'static str {
        "openai"
    }

    async fn stream(&self, request: ChatRequest) -> Result<EventStream> {
        let body = self.build_body(&request);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Http { provider: "openai".into(), source })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                provider: "openai".into(),
                status: status.as_u16(),
                body: text,
            });
        }

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut acc = ChunkAccumulator::default();
            let mut byte_stream = resp.bytes_stream();
            let mut line_buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::Http { provider: "openai".into(), source: e }));
                        return;
                    }
                };
                line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = line_buffer.find('\n') {
                    let line = line_buffer[..pos].to_string();
                    line_buffer = line_buffer[pos + 1..].to_string();

                    match acc.feed_line(&line) {
                        Ok(events) => {
                            let done = events.iter().any(|e| matches!(e, StreamEvent::MessageStop { .. }));
                            for event in events {
                                if tx.send(Ok(event)).is_err() {
                                    return;
                                }
                            }
                            if done {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            return;
                        }
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
        .map(|m| match m.role {
            Role::System => json!({ "role": "system", "content": m.content }),
            Role::User => json!({ "role": "user", "content": m.content }),
            Role::Assistant => {
                if m.tool_calls.is_empty() {
                    json!({ "role": "assistant", "content": m.content })
                } else {
                    json!({
                        "role": "assistant",
                        "content": if m.content.is_empty() { Value::Null } else { json!(m.content) },
                        "tool_calls": m.tool_calls.iter().map(|tc| json!({
                            "id": tc.id,
                            "type": "function",
                            "function": { "name": tc.name, "arguments": tc.arguments.to_string() },
                        })).collect::<Vec<_>>(),
                    })
                }
            }
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": m.tool_call_id,
                "content": m.content,
            }),
        })
        .collect()
}

fn build_tools_payload(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                },
            })
        })
        .collect()
}

/// Normalizes OpenAI's chunked SSE format into [`StreamEvent`]s as they
/// arrive, tracking which tool-call indices have already emitted their
/// `ToolUseStart` so the id/name only fire once.
#[derive(Debug, Default)]
struct ChunkAccumulator {
    started_tool_calls: std::collections::HashSet<usize>,
    usage: Usage,
    message_id: Option<String>,
}

impl ChunkAccumulator {
    fn feed_line(&mut self, line: &str) -> Result<Vec<StreamEvent>> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with(':') {
            return Ok(Vec::new());
        }
        let Some(data) = line.strip_prefix("data: ") else {
            return Ok(Vec::new());
        };
        let data = data.trim();

        if data == "[DONE]" {
            return Ok(vec![StreamEvent::MessageStop { stop_reason: None, usage: self.usage }]);
        }

        let v: Value = serde_json::from_str(data).map_err(|e| ProviderError::ParseFailed {
            provider: "openai".into(),
            reason: format!("invalid JSON in SSE data: {e}"),
        })?;

        if self.message_id.is_none() {
            self.message_id = v["id"].as_str().map(String::from);
        }

        let mut events = Vec::new();

        if let Some(usage_obj) = v.get("usage").filter(|u| !u.is_null()) {
            if let Some(input) = usage_obj["prompt_tokens"].as_u64() {
                self.usage.input_tokens = input as u32;
            }
            if let Some(output) = usage_obj["completion_tokens"].as_u64() {
                self.usage.output_tokens = output as u32;
            }
        }

        let delta = &v["choices"][0]["delta"];
        if delta.is_null() {
            return Ok(events);
        }

        if let Some(content) = delta["content"].as_str() {
            if !content.is_empty() {
                events.push(StreamEvent::TextDelta { index: 0, text: content.to_string() });
            }
        }

        if let Some(tool_calls) = delta["tool_calls"].as_array() {
            for tc in tool_calls {
                let index = tc["index"].as_u64().unwrap_or(0) as usize;
                let func = &tc["function"];

                if !self.started_tool_calls.contains(&index) {
                    if let (Some(id), Some(name)) = (tc["id"].as_str(), func["name"].as_str()) {
                        self.started_tool_calls.insert(index);
                        events.push(StreamEvent::ToolUseStart {
                            index: index as u32,
                            id: id.to_string(),
                            name: name.to_string(),
                        });
                    }
                }

                if let Some(args) = func["arguments"].as_str() {
                    if !args.is_empty() {
                        events.push(StreamEvent::ToolUseDelta {
                            index: index as u32,
                            partial_json: args.to_string(),
                        });
                    }
                }
            }
        }

        if let Some(reason) = v["choices"][0]["finish_reason"].as_str() {
            events.push(StreamEvent::ContentStop { index: 0 });
            let _ = reason;
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_emits_text_delta() {
        let mut acc = ChunkAccumulator::default();
        let events = acc
            .feed_line(r#"data: {"id":"1","choices":[{"index":0,"delta":{"content":"hi"}}]}"#)
            .unwrap();
        assert!(matches!(events[0], StreamEvent::TextDelta { .. }));
    }

    #[test]
    fn tool_call_start_fires_once() {
        let mut acc = ChunkAccumulator::default();
        acc.feed_line(
            r#"data: {"id":"1","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"read_file","arguments":""}}]}}]}"#,
        )
        .unwrap();
        let events = acc
            .feed_line(
                r#"data: {"id":"1","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{}"}}]}}]}"#,
            )
            .unwrap();
        assert!(events.iter().all(|e| !matches!(e, StreamEvent::ToolUseStart { .. })));
    }

    #[test]
    fn done_sentinel_emits_message_stop() {
        let mut acc = ChunkAccumulator::default();
        let events = acc.feed_line("data: [DONE]").unwrap();
        assert!(matches!(events[0], StreamEvent::MessageStop { .. }));
    }
}
