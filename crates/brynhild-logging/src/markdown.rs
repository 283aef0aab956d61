//! Renders a presentation-grade markdown transcript from a JSONL
//! conversation log: headings per session, fenced blocks for tool
//! calls/results, and a collapsed thinking block per assistant turn.

use serde_json::Value;

use crate::error::Result;

/// How to render `thinking` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingStyle {
    /// `<details>` block, collapsed by default.
    Collapsible,
    /// Shown in full, uncollapsed.
    Full,
    /// Word-count only.
    Summary,
    /// Omitted entirely.
    Hidden,
}

pub struct MarkdownExportOptions {
    pub title: Option<String>,
    pub thinking_style: ThinkingStyle,
    pub truncate_tool_output: usize,
}

impl Default for MarkdownExportOptions {
    fn default() -> Self {
        Self {
            title: None,
            thinking_style: ThinkingStyle::Collapsible,
            truncate_tool_output: 2000,
        }
    }
}

struct Summary {
    total_input_tokens: u64,
    total_output_tokens: u64,
    total_cost: f64,
    tools_used: std::collections::BTreeMap<String, u32>,
    tool_recoveries: u32,
}

/// Parses a JSONL conversation log (one event per line) and renders it as
/// a markdown transcript.
pub fn export_log_to_markdown(jsonl: &str, options: &MarkdownExportOptions) -> Result<String> {
    let mut session_id = String::new();
    let mut provider = String::new();
    let mut model = String::new();
    let mut sections: Vec<String> = Vec::new();
    let mut pending_thinking: Option<String> = None;
    let mut summary = Summary {
        total_input_tokens: 0,
        total_output_tokens: 0,
        total_cost: 0.0,
        tools_used: std::collections::BTreeMap::new(),
        tool_recoveries: 0,
    };

    for line in jsonl.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed log line");
                continue;
            }
        };

        let event_type = event.get("event_type").and_then(Value::as_str).unwrap_or("");

        match event_type {
            "session_start" => {
                session_id = str_field(&event, "session_id");
                provider = str_field(&event, "provider");
                model = str_field(&event, "model");
            }
            "user_message" => {
                flush_thinking(&mut pending_thinking, &mut sections, options);
                sections.push(format!("### User\n\n{}\n", str_field(&event, "content")));
            }
            "assistant_message" => {
                let content = str_field(&event, "content");
                let thinking = event
                    .get("thinking")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .or_else(|| pending_thinking.take());

                let mut section = String::from("### Assistant\n\n");
                if !content.is_empty() {
                    section.push_str(&content);
                    section.push('\n');
                }
                if let Some(t) = thinking {
                    if let Some(rendered) = format_thinking(&t, options.thinking_style) {
                        section.push('\n');
                        section.push_str(&rendered);
                    }
                }
                sections.push(section);
            }
            "thinking" => {
                let content = str_field(&event, "content");
                match &mut pending_thinking {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(&content);
                    }
                    None => pending_thinking = Some(content),
                }
            }
            "tool_call" => {
                flush_thinking(&mut pending_thinking, &mut sections, options);
                let tool_name = str_field(&event, "tool_name");
                *summary.tools_used.entry(tool_name.clone()).or_insert(0) += 1;

                let input_json = event
                    .get("tool_input")
                    .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
                    .unwrap_or_default();
                let input_json = truncate(&input_json, options.truncate_tool_output);

                sections.push(format!(
                    "### \u{1f527} Tool: {tool_name}\n\n**Input:**\n```json\n{input_json}\n```\n"
                ));
            }
            "tool_result" => {
                let success = event.get("success").and_then(Value::as_bool).unwrap_or(false);
                let content = if success {
                    event
                        .get("output")
                        .and_then(Value::as_str)
                        .unwrap_or("(no output)")
                        .to_string()
                } else {
                    event
                        .get("error")
                        .and_then(Value::as_str)
                        .or_else(|| event.get("output").and_then(Value::as_str))
                        .unwrap_or("(no details)")
                        .to_string()
                };
                let content = truncate(&content, options.truncate_tool_output);

                let (icon, status) = if success { ("\u{2705}", "Success") } else { ("\u{274c}", "Failed") };
                let mut section = format!("**Output:** {icon} {status}\n");
                if !content.trim().is_empty() {
                    if content.contains('\n') || content.len() > 100 {
                        section.push_str(&format!("```\n{content}\n```\n"));
                    } else {
                        section.push_str(&format!("`{content}`\n"));
                    }
                }
                sections.push(section);
            }
            "tool_call_recovered" => {
                summary.tool_recoveries += 1;
            }
            "usage" => {
                if let Some(v) = event.get("input_tokens").and_then(Value::as_u64) {
                    summary.total_input_tokens = v;
                }
                if let Some(v) = event.get("output_tokens").and_then(Value::as_u64) {
                    summary.total_output_tokens += v;
                }
                if let Some(v) = event.get("cost_usd").and_then(Value::as_f64) {
                    summary.total_cost += v;
                }
            }
            "error" => {
                let mut section = format!("### \u{274c} Error\n\n**Error:** {}\n", str_field(&event, "error"));
                if let Some(ctx) = event.get("context").and_then(Value::as_str) {
                    section.push_str(&format!("\n**Context:** {ctx}\n"));
                }
                sections.push(section);
            }
            _ => {}
        }
    }

    flush_thinking(&mut pending_thinking, &mut sections, options);

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| if session_id.is_empty() { "Brynhild Session".to_string() } else { format!("Session {session_id}") });

    let mut header = format!("# Brynhild Session: {title}\n\n");
    header.push_str(&format!("> **Model**: {model}  \n"));
    header.push_str(&format!("> **Provider**: {provider}  \n"));
    if !session_id.is_empty() {
        header.push_str(&format!("> **Session ID**: {session_id}\n"));
    }
    header.push_str("\n---\n\n## Conversation\n\n");

    let mut document = header;
    document.push_str(&sections.join("\n"));
    document.push_str(&render_summary(&summary));

    Ok(document)
}

fn str_field(event: &Value, key: &str) -> String {
    event.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn truncate(s: &str, limit: usize) -> String {
    if limit == 0 || s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... [truncated]", &s[..end])
}

fn format_thinking(thinking: &str, style: ThinkingStyle) -> Option<String> {
    if thinking.is_empty() {
        return None;
    }
    let word_count = thinking.split_whitespace().count();
    match style {
        ThinkingStyle::Hidden => None,
        ThinkingStyle::Summary => Some(format!("*\u{1f4ad} Thinking ({word_count} words)*\n")),
        ThinkingStyle::Collapsible => Some(format!(
            "<details>\n<summary>\u{1f4ad} Thinking ({word_count} words)</summary>\n\n{thinking}\n\n</details>\n"
        )),
        ThinkingStyle::Full => Some(format!("#### \u{1f4ad} Thinking\n\n{thinking}\n")),
    }
}

fn flush_thinking(pending: &mut Option<String>, sections: &mut Vec<String>, options: &MarkdownExportOptions) {
    if let Some(t) = pending.take()
        && let Some(rendered) = format_thinking(&t, options.thinking_style)
    {
        sections.push(rendered);
    }
}

fn render_summary(summary: &Summary) -> String {
    let mut rows: Vec<(String, String)> = Vec::new();
    if summary.total_input_tokens > 0 {
        rows.push(("Context Size".into(), format!("{} tokens", summary.total_input_tokens)));
    }
    if summary.total_output_tokens > 0 {
        rows.push(("Generated".into(), format!("{} tokens", summary.total_output_tokens)));
    }
    if summary.total_cost > 0.0 {
        rows.push(("Estimated Cost".into(), format!("${:.4}", summary.total_cost)));
    }
    if !summary.tools_used.is_empty() {
        let tools_str = summary
            .tools_used
            .iter()
            .map(|(name, count)| format!("{name} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        rows.push(("Tools Used".into(), tools_str));
    }
    if summary.tool_recoveries > 0 {
        rows.push(("Tool Recoveries".into(), summary.tool_recoveries.to_string()));
    }

    if rows.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n---\n\n## Session Summary\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    for (metric, value) in rows {
        out.push_str(&format!("| {metric} | {value} |\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jsonl(lines: &[&str]) -> String {
        lines.join("\n")
    }

    #[test]
    fn renders_header_and_messages() {
        let log = jsonl(&[
            r#"{"event_type":"session_start","session_id":"s1","provider":"anthropic","model":"claude"}"#,
            r#"{"event_type":"user_message","content":"hi"}"#,
            r#"{"event_type":"assistant_message","content":"hello back"}"#,
        ]);
        let md = export_log_to_markdown(&log, &MarkdownExportOptions::default()).unwrap();
        assert!(md.contains("Session s1"));
        assert!(md.contains("**Model**: claude"));
        assert!(md.contains("### User"));
        assert!(md.contains("hello back"));
    }

    #[test]
    fn buffers_thinking_into_next_assistant_message() {
        let log = jsonl(&[
            r#"{"event_type":"session_start","session_id":"s1","provider":"x","model":"y"}"#,
            r#"{"event_type":"thinking","content":"pondering"}"#,
            r#"{"event_type":"assistant_message","content":"done"}"#,
        ]);
        let md = export_log_to_markdown(&log, &MarkdownExportOptions::default()).unwrap();
        assert!(md.contains("pondering"));
        assert!(md.contains("Thinking"));
    }

    #[test]
    fn tool_call_and_result_render_as_fenced_blocks() {
        let log = jsonl(&[
            r#"{"event_type":"session_start","session_id":"s1","provider":"x","model":"y"}"#,
            r#"{"event_type":"tool_call","tool_name":"read_file","tool_input":{"path":"a.txt"}}"#,
            r#"{"event_type":"tool_result","tool_name":"read_file","success":true,"output":"contents"}"#,
        ]);
        let md = export_log_to_markdown(&log, &MarkdownExportOptions::default()).unwrap();
        assert!(md.contains("Tool: read_file"));
        assert!(md.contains("```json"));
        assert!(md.contains("Tools Used"));
    }

    #[test]
    fn hidden_thinking_style_omits_block() {
        let log = jsonl(&[
            r#"{"event_type":"session_start","session_id":"s1","provider":"x","model":"y"}"#,
            r#"{"event_type":"thinking","content":"secret"}"#,
            r#"{"event_type":"assistant_message","content":"done"}"#,
        ]);
        let opts = MarkdownExportOptions {
            thinking_style: ThinkingStyle::Hidden,
            ..Default::default()
        };
        let md = export_log_to_markdown(&log, &opts).unwrap();
        assert!(!md.contains("secret"));
    }
}
