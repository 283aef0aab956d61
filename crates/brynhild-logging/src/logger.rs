//! Append-only JSONL conversation logger. Every event is flushed to disk
//! immediately so a crash mid-session loses at most the in-flight write.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{LoggingError, Result};
use crate::event::LogEvent;

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

struct Inner {
    file: Option<File>,
    event_count: u64,
    context_version: u32,
}

/// Logs conversation events to a JSONL file, one event per line.
pub struct ConversationLogger {
    path: Option<PathBuf>,
    session_id: String,
    inner: Mutex<Inner>,
}

impl ConversationLogger {
    /// Open (creating if needed) a log file at `path` and write the
    /// `session_start` event. Pass `enabled=false` to get a no-op logger
    /// (used for `--no-log`).
    pub fn new(
        path: impl AsRef<Path>,
        session_id: impl Into<String>,
        provider: &str,
        model: &str,
        enabled: bool,
    ) -> Result<Self> {
        let session_id = session_id.into();
        if !enabled {
            return Ok(Self {
                path: None,
                session_id,
                inner: Mutex::new(Inner {
                    file: None,
                    event_count: 0,
                    context_version: 0,
                }),
            });
        }

        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| LoggingError::Open {
                path: path.clone(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LoggingError::Open {
                path: path.clone(),
                source,
            })?;

        let logger = Self {
            path: Some(path),
            session_id: session_id.clone(),
            inner: Mutex::new(Inner {
                file: Some(file),
                event_count: 0,
                context_version: 0,
            }),
        };

        logger.log(LogEvent::SessionStart {
            session_id,
            provider: provider.to_string(),
            model: model.to_string(),
        })?;

        Ok(logger)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Write one event, stamping it with the current time and a monotonic
    /// `event_number`. A no-op if the logger was constructed disabled.
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        if guard.file.is_none() {
            return Ok(());
        }

        guard.event_count += 1;
        let event_number = guard.event_count;

        let mut value = serde_json::to_value(&event)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
            map.insert("event_number".to_string(), Value::from(event_number));
        }

        let line = serde_json::to_string(&value)?;
        let file = guard.file.as_mut().unwrap();
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    pub fn log_context_init(&self, base_system_prompt: impl Into<String>) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        guard.context_version = 1;
        drop(guard);
        self.log(LogEvent::ContextInit {
            base_system_prompt: base_system_prompt.into(),
            context_version: 1,
        })
    }

    /// Logs one context injection, bumping and returning the new context
    /// version.
    #[allow(clippy::too_many_arguments)]
    pub fn log_context_injection(
        &self,
        source: impl Into<String>,
        location: impl Into<String>,
        content: impl Into<String>,
        origin: Option<String>,
        trigger_type: Option<String>,
        trigger_match: Option<String>,
        metadata: Option<Value>,
    ) -> Result<u32> {
        let content = content.into();
        let content_hash = sha256_hex(&content);
        let version = {
            let mut guard = self.inner.lock().unwrap();
            guard.context_version += 1;
            guard.context_version
        };
        self.log(LogEvent::ContextInjection {
            context_version: version,
            source: source.into(),
            location: location.into(),
            content,
            content_hash,
            origin,
            trigger_type,
            trigger_match,
            metadata,
        })?;
        Ok(version)
    }

    pub fn log_context_ready(&self, final_prompt: &str) -> Result<()> {
        let version = self.inner.lock().unwrap().context_version;
        self.log(LogEvent::ContextReady {
            context_version: version,
            system_prompt_hash: sha256_hex(final_prompt),
        })
    }

    pub fn log_user_message(&self, content: impl Into<String>) -> Result<()> {
        self.log(LogEvent::UserMessage {
            content: content.into(),
        })
    }

    pub fn log_assistant_message(
        &self,
        content: impl Into<String>,
        thinking: Option<String>,
    ) -> Result<()> {
        self.log(LogEvent::AssistantMessage {
            content: content.into(),
            thinking,
        })
    }

    pub fn log_thinking(&self, content: impl Into<String>) -> Result<()> {
        self.log(LogEvent::Thinking {
            content: content.into(),
        })
    }

    pub fn log_tool_call(
        &self,
        tool_name: impl Into<String>,
        tool_input: Value,
        tool_id: Option<String>,
    ) -> Result<()> {
        self.log(LogEvent::ToolCall {
            tool_name: tool_name.into(),
            tool_input,
            tool_id,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_tool_result(
        &self,
        tool_name: impl Into<String>,
        success: bool,
        output: Option<String>,
        error: Option<String>,
        tool_id: Option<String>,
        duration_ms: Option<u64>,
    ) -> Result<()> {
        self.log(LogEvent::ToolResult {
            tool_name: tool_name.into(),
            success,
            output,
            error,
            tool_id,
            duration_ms,
        })
    }

    pub fn log_tool_call_recovered(
        &self,
        tool_name: impl Into<String>,
        tool_input: Value,
    ) -> Result<()> {
        self.log(LogEvent::ToolCallRecovered {
            tool_name: tool_name.into(),
            tool_input,
        })
    }

    /// Logs a skill being pulled into context at runtime — either an
    /// explicit `/skill <name>` invocation (`trigger_type: "explicit"`) or
    /// an automatic keyword match (`trigger_type: "keyword"`, with the
    /// matched phrase in `trigger_match`).
    pub fn log_skill_trigger(
        &self,
        skill_name: impl Into<String>,
        trigger_type: impl Into<String>,
        trigger_match: Option<String>,
    ) -> Result<()> {
        self.log(LogEvent::SkillTrigger {
            skill_name: skill_name.into(),
            trigger_type: trigger_type.into(),
            trigger_match,
        })
    }

    pub fn log_usage(
        &self,
        input_tokens: u32,
        output_tokens: u32,
        cost_usd: Option<f64>,
    ) -> Result<()> {
        self.log(LogEvent::Usage {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            cost_usd,
        })
    }

    pub fn log_error(&self, error: impl Into<String>, context: Option<String>) -> Result<()> {
        self.log(LogEvent::Error {
            error: error.into(),
            context,
        })
    }

    /// Writes `session_end` with the total event count.
    pub fn close(&self) -> Result<()> {
        let total_events = self.inner.lock().unwrap().event_count + 1;
        self.log(LogEvent::SessionEnd { total_events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_one_line_per_event_and_flushes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.jsonl");
        let logger = ConversationLogger::new(&path, "s1", "anthropic", "claude", true).unwrap();

        logger.log_user_message("hello").unwrap();
        logger
            .log_tool_call("read_file", json!({"path": "a.txt"}), Some("call_1".into()))
            .unwrap();
        logger.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4); // session_start, user_message, tool_call, session_end
        for line in &lines {
            let v: Value = serde_json::from_str(line).unwrap();
            assert!(v.get("event_number").is_some());
            assert!(v.get("timestamp").is_some());
        }
    }

    #[test]
    fn disabled_logger_is_a_no_op() {
        let logger = ConversationLogger::new("/nonexistent/path.jsonl", "s1", "x", "y", false).unwrap();
        assert!(!logger.is_enabled());
        logger.log_user_message("hi").unwrap();
    }

    #[test]
    fn context_injection_bumps_version() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.jsonl");
        let logger = ConversationLogger::new(&path, "s1", "anthropic", "claude", true).unwrap();
        logger.log_context_init("base prompt").unwrap();
        let v1 = logger
            .log_context_injection("rules", "system_prompt_prepend", "rule content", None, None, None, None)
            .unwrap();
        let v2 = logger
            .log_context_injection("skill_metadata", "system_prompt_append", "skill content", None, None, None, None)
            .unwrap();
        assert_eq!(v2, v1 + 1);
    }
}
