//! The Anthropic Messages API provider: request building, SSE parsing,
//! and normalization into the unified [`StreamEvent`] vocabulary.

use futures::{stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::provider::{EventStream, Provider};
use crate::reasoning::anthropic_thinking_budget;
use crate::types::{ChatRequest, Message, Role, StreamEvent, ToolDefinition, Usage};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, ANTHROPIC_BASE_URL)
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
        let (system, messages) = split_system_message(&request.messages);

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens.unwrap_or(8192),
            "messages": messages,
            "stream": true,
        });

        if let Some(system) = system {
            body["system"] = json!(system);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }
        if !request.tools.is_empty() {
            body["tools"] = json!(build_tools_payload(&request.tools));
        }
        if let Some(budget) = anthropic_thinking_budget(&request.reasoning) {
            body["thinking"] = json!({ "type": "enabled", "budget_tokens": budget });
        }

        body
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn provider_type(&self) -> &'static str {
        "anthropic"
    }

    async fn stream(&self, request: ChatRequest) -> Result<EventStream> {
        let body = self.build_body(&request);
        let url = format!("{}/v1/messages", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| ProviderError::ApiError {
                provider: "anthropic".into(),
                status: 0,
                body: "api key contains invalid header characters".into(),
            })?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Http { provider: "anthropic".into(), source })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                provider: "anthropic".into(),
                status: status.as_u16(),
                body: text,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut parser = SseParser::new();
            let mut byte_stream = resp.bytes_stream();
            let mut line_buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::Http {
                            provider: "anthropic".into(),
                            source: e,
                        }));
                        return;
                    }
                };
                let text = String::from_utf8_lossy(&chunk);
                line_buffer.push_str(&text);

                while let Some(pos) = line_buffer.find('\n') {
                    let line = line_buffer[..pos].to_string();
                    line_buffer = line_buffer[pos + 1..].to_string();

                    match parser.parse_line(&line) {
                        Ok(Some(event)) => {
                            let is_stop = matches!(event, StreamEvent::MessageStop { .. });
                            if tx.send(Ok(event)).is_err() {
                                return;
                            }
                            if is_stop {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            return;
                        }
                    }
                }
            }
        });

        // `UnboundedReceiver` doesn't implement `Stream` without pulling in
        // `tokio-stream`; `poll_fn` wraps it directly instead.
        let mut rx = rx;
        let stream = stream::poll_fn(move |cx| rx.poll_recv(cx));
        Ok(Box::pin(stream))
    }
}

fn split_system_message(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system: Option<String> = None;
    let mut wire_messages: Vec<Value> = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => match &mut system {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(&msg.content);
                }
                None => system = Some(msg.content.clone()),
            },
            Role::User => {
                wire_messages.push(json!({ "role": "user", "content": msg.content }));
            }
            Role::Assistant => {
                if msg.tool_calls.is_empty() {
                    wire_messages.push(json!({ "role": "assistant", "content": msg.content }));
                } else {
                    let mut content: Vec<Value> = Vec::new();
                    if !msg.content.is_empty() {
                        content.push(json!({ "type": "text", "text": msg.content }));
                    }
                    for tc in &msg.tool_calls {
                        content.push(json!({
                            "type": "tool_use",
                            "id": tc.id,
                            "name": tc.name,
                            "input": tc.arguments,
                        }));
                    }
                    wire_messages.push(json!({ "role": "assistant", "content": content }));
                }
            }
            Role::Tool => {
                wire_messages.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": msg.tool_call_id,
                        "content": msg.content,
                    }],
                }));
            }
        }
    }

    (system, wire_messages)
}

fn build_tools_payload(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
            })
        })
        .collect()
}

/// Parses Anthropic's SSE format directly into the unified [`StreamEvent`]
/// vocabulary, including the `thinking_delta` content variant.
#[derive(Debug, Default)]
struct SseParser {
    current_event_type: Option<String>,
    usage: Usage,
}

impl SseParser {
    fn new() -> Self {
        Self::default()
    }

    fn parse_line(&mut self, line: &str) -> Result<Option<StreamEvent>> {
        let line = line.trim_end();

        if line.is_empty() || line.starts_with(':') {
            return Ok(None);
        }

        if let Some(event_type) = line.strip_prefix("event: ") {
            self.current_event_type = Some(event_type.to_owned());
            return Ok(None);
        }

        if let Some(data) = line.strip_prefix("data: ") {
            let event_type = self.current_event_type.take().unwrap_or_else(|| "unknown".into());
            return self.parse_event(&event_type, data);
        }

        Ok(None)
    }

    fn parse_event(&mut self, event_type: &str, data: &str) -> Result<Option<StreamEvent>> {
        match event_type {
            "message_start" => {
                let v = parse_json(data)?;
                let message = &v["message"];
                if let Some(input) = message["usage"]["input_tokens"].as_u64() {
                    self.usage.input_tokens = input as u32;
                }
                Ok(Some(StreamEvent::MessageStart {
                    message_id: json_string(message, "id"),
                    model: json_string(message, "model"),
                }))
            }
            "content_block_start" => {
                let v = parse_json(data)?;
                let index = v["index"].as_u64().unwrap_or(0) as u32;
                let block = &v["content_block"];
                match json_string(block, "type").as_str() {
                    "tool_use" => Ok(Some(StreamEvent::ToolUseStart {
                        index,
                        id: json_string(block, "id"),
                        name: json_string(block, "name"),
                    })),
                    _ => Ok(None),
                }
            }
            "content_block_delta" => {
                let v = parse_json(data)?;
                let index = v["index"].as_u64().unwrap_or(0) as u32;
                let delta = &v["delta"];
                match json_string(delta, "type").as_str() {
                    "text_delta" => Ok(Some(StreamEvent::TextDelta { index, text: json_string(delta, "text") })),
                    "thinking_delta" => Ok(Some(StreamEvent::ThinkingDelta { index, text: json_string(delta, "thinking") })),
                    "input_json_delta" => Ok(Some(StreamEvent::ToolUseDelta {
                        index,
                        partial_json: json_string(delta, "partial_json"),
                    })),
                    _ => Ok(None),
                }
            }
            "content_block_stop" => {
                let v = parse_json(data)?;
                Ok(Some(StreamEvent::ContentStop { index: v["index"].as_u64().unwrap_or(0) as u32 }))
            }
            "message_delta" => {
                let v = parse_json(data)?;
                if let Some(output) = v["usage"]["output_tokens"].as_u64() {
                    self.usage.output_tokens = output as u32;
                }
                Ok(None)
            }
            "message_stop" => Ok(Some(StreamEvent::MessageStop { stop_reason: None, usage: self.usage })),
            "ping" | "error" => Ok(None),
            _ => {
                if data.trim() == "[DONE]" {
                    Ok(Some(StreamEvent::MessageStop { stop_reason: None, usage: self.usage }))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

fn parse_json(data: &str) -> Result<Value> {
    serde_json::from_str(data).map_err(|e| ProviderError::ParseFailed {
        provider: "anthropic".into(),
        reason: format!("invalid JSON in SSE data: {e}"),
    })
}

fn json_string(v: &Value, field: &str) -> String {
    v[field].as_str().unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_delta() {
        let mut parser = SseParser::new();
        parser.parse_line("event: content_block_delta").unwrap();
        let event = parser
            .parse_line(r#"data: {"index":0,"delta":{"type":"text_delta","text":"hi"}}"#)
            .unwrap()
            .unwrap();
        match event {
            StreamEvent::TextDelta { index, text } => {
                assert_eq!(index, 0);
                assert_eq!(text, "hi");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_thinking_delta() {
        let mut parser = SseParser::new();
        parser.parse_line("event: content_block_delta").unwrap();
        let event = parser
            .parse_line(r#"data: {"index":0,"delta":{"type":"thinking_delta","thinking":"pondering"}}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(event, StreamEvent::ThinkingDelta { .. }));
    }

    #[test]
    fn parses_tool_use_start() {
        let mut parser = SseParser::new();
        parser.parse_line("event: content_block_start").unwrap();
        let event = parser
            .parse_line(r#"data: {"index":1,"content_block":{"type":"tool_use","id":"tu_1","name":"read_file"}}"#)
            .unwrap()
            .unwrap();
        match event {
            StreamEvent::ToolUseStart { id, name, .. } => {
                assert_eq!(id, "tu_1");
                assert_eq!(name, "read_file");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn splits_system_message_from_conversation() {
        let messages = vec![Message::system("be nice"), Message::user("hi")];
        let (system, wire) = split_system_message(&messages);
        assert_eq!(system.as_deref(), Some("be nice"));
        assert_eq!(wire.len(), 1);
    }
}
