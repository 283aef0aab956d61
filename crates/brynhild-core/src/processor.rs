//! The conversation tool-loop: streams a provider's response, executes
//! any tool calls it requests (through hook and sandbox mediation), and
//! re-enters the model with the results until it produces a tool-free
//! answer, `max_tool_rounds` is exhausted, or the caller cancels.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use brynhild_providers::{ChatRequest, Message, Provider, StreamEvent, ToolCall, Usage};
use futures::StreamExt;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::recovery::{recover_tool_calls, RecoveredCall, RecoveryBudget};
use crate::tool::ToolRegistry;
use crate::validator::validate_message_sequence;

/// Decision returned by a pre-tool-use hook or permission check.
#[derive(Debug, Clone, PartialEq)]
pub enum HookDecision {
    Allow,
    Deny(String),
    /// Don't run the tool, but don't treat the call as a failure either —
    /// it succeeds with a `[skipped]` result.
    Skip,
}

/// Mediates tool execution on behalf of the (out-of-crate) hook pipeline.
/// Implemented by `brynhild-hooks` and wired in by the CLI; absent here
/// means every call is allowed.
#[async_trait]
pub trait PreToolHook: Send + Sync {
    async fn check(&self, tool_name: &str, arguments: &Value) -> HookDecision;
}

/// Notified once a tool has executed (or been skipped/denied), on behalf
/// of the `POST_TOOL_USE` hook event. Can't change the result the model
/// sees — a failure here is logged, never surfaced as a tool error.
#[async_trait]
pub trait PostToolHook: Send + Sync {
    async fn notify(&self, tool_name: &str, arguments: &Value, result: &str);
}

/// Mediates tool execution on behalf of the (out-of-crate) OS sandbox.
/// Implemented by `brynhild-sandbox`.
#[async_trait]
pub trait SandboxGuard: Send + Sync {
    async fn validate(&self, tool_name: &str, arguments: &Value) -> std::result::Result<(), String>;
}

/// Interactive allow/deny for tools that `requires_permission()`. Absent
/// means every permission-requiring call is allowed, matching
/// `--dangerously-skip-permissions`.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check(&self, tool_name: &str, arguments: &Value) -> HookDecision;
}

/// Callback invoked with each streamed text delta, for live rendering.
pub type TextDeltaCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// A cooperative cancellation flag shared between a caller (e.g. a
/// ctrl-c handler) and the processor. Checked between stream events,
/// before each tool execution, and at the top of every round — never
/// pre-empts mid-await.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub max_tool_rounds: u32,
    pub tool_output_cap: usize,
    pub disabled_tools: Vec<String>,
    /// When set, every tool call is synthesized as `[dry run]` instead of
    /// actually executing, while pre/post hooks still run around the
    /// no-op.
    pub dry_run: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            max_tool_rounds: 25,
            tool_output_cap: 30_000,
            disabled_tools: Vec::new(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    pub messages: Vec<Message>,
    pub final_text: String,
    pub rounds_used: u32,
    pub usage: Usage,
    /// Why the loop stopped: `"end_turn"`, `"max_rounds"`, or
    /// `"cancelled"`.
    pub stop_reason: String,
    pub cancelled: bool,
}

pub struct ConversationProcessor {
    registry: Option<ToolRegistry>,
    config: ProcessorConfig,
    recovery_budget: RecoveryBudget,
    hook: Option<Arc<dyn PreToolHook>>,
    post_hook: Option<Arc<dyn PostToolHook>>,
    sandbox: Option<Arc<dyn SandboxGuard>>,
    permission: Option<Arc<dyn PermissionChecker>>,
}

impl ConversationProcessor {
    /// `registry` of `None` disables tool dispatch entirely: the provider
    /// is never offered any tool definitions and every round ends as soon
    /// as it replies (recovery is also skipped, since there's nothing to
    /// recover a call against).
    pub fn new(registry: Option<ToolRegistry>, config: ProcessorConfig) -> Self {
        ConversationProcessor {
            registry,
            config,
            recovery_budget: RecoveryBudget::default(),
            hook: None,
            post_hook: None,
            sandbox: None,
            permission: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn PreToolHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_post_hook(mut self, post_hook: Arc<dyn PostToolHook>) -> Self {
        self.post_hook = Some(post_hook);
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn SandboxGuard>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    pub fn with_permission_checker(mut self, permission: Arc<dyn PermissionChecker>) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Runs the conversation forward from `messages` until the model
    /// produces a response with no tool calls, `max_tool_rounds` is
    /// exhausted, or `cancel` fires. `cancel` of `None` behaves as if it
    /// were never signalled.
    pub async fn run_turn(
        &mut self,
        provider: &dyn Provider,
        mut messages: Vec<Message>,
        request_template: ChatRequest,
        cancel: Option<CancellationToken>,
        on_text_delta: Option<TextDeltaCallback>,
    ) -> Result<TurnOutcome> {
        self.recovery_budget.start_turn();
        let mut usage = Usage::default();
        let cancelled = || cancel.as_ref().is_some_and(CancellationToken::is_cancelled);

        for round in 0..self.config.max_tool_rounds {
            if cancelled() {
                return Ok(TurnOutcome {
                    messages,
                    final_text: String::new(),
                    rounds_used: round,
                    usage,
                    stop_reason: "cancelled".into(),
                    cancelled: true,
                });
            }

            validate_message_sequence(&messages, round > 0)?;

            let mut request = request_template.clone();
            request.messages = messages.clone();
            if provider.supports_tools() && self.registry.is_some() {
                request.tools = self
                    .registry
                    .as_ref()
                    .map(|r| r.definitions(&self.config.disabled_tools))
                    .unwrap_or_default();
            } else {
                request.tools = Vec::new();
            }

            let consumed = self.consume_stream(provider, request, &on_text_delta, &cancel).await?;
            let Some((text, thinking, tool_uses, stop_usage)) = consumed else {
                return Ok(TurnOutcome {
                    messages,
                    final_text: String::new(),
                    rounds_used: round + 1,
                    usage,
                    stop_reason: "cancelled".into(),
                    cancelled: true,
                });
            };
            usage = stop_usage;

            let mut calls: Vec<ToolCall> = tool_uses
                .into_iter()
                .map(|(_, id, name, args_json)| ToolCall {
                    id,
                    name,
                    arguments: serde_json::from_str(&args_json).unwrap_or(Value::Null),
                })
                .collect();

            if calls.is_empty() {
                if let Some(registry) = &self.registry {
                    let recovered = recover_tool_calls(&thinking, registry, &mut self.recovery_budget);
                    calls.extend(recovered.into_iter().map(synthesize_tool_call));
                }
            }

            if calls.is_empty() {
                return Ok(TurnOutcome {
                    messages,
                    final_text: text,
                    rounds_used: round + 1,
                    usage,
                    stop_reason: "end_turn".into(),
                    cancelled: false,
                });
            }

            messages.push(Message::assistant_tool_calls(calls.clone()));

            let (results, tool_cancelled) = self.execute_tool_calls(&calls, &cancel).await;
            for (call, output) in calls.iter().zip(&results) {
                messages.push(Message::tool_result(&call.id, &truncate(output, self.config.tool_output_cap)));
            }

            if tool_cancelled {
                return Ok(TurnOutcome {
                    messages,
                    final_text: text,
                    rounds_used: round + 1,
                    usage,
                    stop_reason: "cancelled".into(),
                    cancelled: true,
                });
            }
        }

        Ok(TurnOutcome {
            messages,
            final_text: String::new(),
            rounds_used: self.config.max_tool_rounds,
            usage,
            stop_reason: "max_rounds".into(),
            cancelled: false,
        })
    }

    /// Returns `None` if `cancel` fired before the stream produced a
    /// `message_stop` — the caller treats that as a partial assistant
    /// message that never finished emitting, and drops it from history.
    async fn consume_stream(
        &self,
        provider: &dyn Provider,
        request: ChatRequest,
        on_text_delta: &Option<TextDeltaCallback>,
        cancel: &Option<CancellationToken>,
    ) -> Result<Option<(String, String, Vec<(u32, String, String, String)>, Usage)>> {
        let mut event_stream = provider.stream(request).await?;

        let mut text = String::new();
        let mut thinking = String::new();
        // index -> (id, name, partial_json)
        let mut tool_uses: BTreeMap<u32, (String, String, String)> = BTreeMap::new();
        let mut usage = Usage::default();

        while let Some(event) = event_stream.next().await {
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Ok(None);
            }

            match event? {
                StreamEvent::MessageStart { .. } => {}
                StreamEvent::TextDelta { text: delta, .. } => {
                    if let Some(cb) = on_text_delta {
                        cb(&delta);
                    }
                    text.push_str(&delta);
                }
                StreamEvent::ThinkingDelta { text: delta, .. } => {
                    thinking.push_str(&delta);
                }
                StreamEvent::ToolUseStart { index, id, name } => {
                    tool_uses.insert(index, (id, name, String::new()));
                }
                StreamEvent::ToolUseDelta { index, partial_json } => {
                    if let Some(entry) = tool_uses.get_mut(&index) {
                        entry.2.push_str(&partial_json);
                    }
                }
                StreamEvent::ContentStop { .. } => {}
                StreamEvent::MessageStop { usage: final_usage, .. } => {
                    usage = final_usage;
                    break;
                }
            }
        }

        let ordered = tool_uses
            .into_iter()
            .map(|(index, (id, name, json))| (index, id, name, json))
            .collect();

        Ok(Some((text, thinking, ordered, usage)))
    }

    /// Executes each call in order — a tool's side effects (and a hook's
    /// view of them) must be sequenced within a turn, not raced. Returns
    /// the outputs gathered so far alongside whether `cancel` fired
    /// mid-dispatch, in which case the remaining calls are left
    /// unexecuted and unrepresented in the returned vector.
    async fn execute_tool_calls(&self, calls: &[ToolCall], cancel: &Option<CancellationToken>) -> (Vec<String>, bool) {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return (outputs, true);
            }

            let output = self.execute_one_tool_call(call).await;
            outputs.push(output);
        }

        (outputs, false)
    }

    async fn execute_one_tool_call(&self, call: &ToolCall) -> String {
        let tool_name = &call.name;
        let arguments = &call.arguments;

        if let Some(permission) = &self.permission {
            let requires = self
                .registry
                .as_ref()
                .and_then(|r| r.get(tool_name).ok())
                .map(|t| t.requires_permission())
                .unwrap_or(false);
            if requires {
                match permission.check(tool_name, arguments).await {
                    HookDecision::Deny(reason) => return format!("denied: {reason}"),
                    HookDecision::Skip => return self.finish_tool_call(call, "[skipped]".to_string()).await,
                    HookDecision::Allow => {}
                }
            }
        }

        if let Some(hook) = &self.hook {
            match hook.check(tool_name, arguments).await {
                HookDecision::Deny(reason) => return format!("blocked by hook: {reason}"),
                HookDecision::Skip => return self.finish_tool_call(call, "[skipped]".to_string()).await,
                HookDecision::Allow => {}
            }
        }

        if let Some(sandbox) = &self.sandbox {
            if let Err(reason) = sandbox.validate(tool_name, arguments).await {
                return format!("sandbox rejected: {reason}");
            }
        }

        let output = if self.config.dry_run {
            "[dry run]".to_string()
        } else {
            match self.registry.as_ref().and_then(|r| r.get(tool_name).ok()) {
                Some(tool) => match tool.execute(arguments.clone()).await {
                    Ok(output) => output,
                    Err(reason) => format!("error: {reason}"),
                },
                None => CoreError::UnknownTool(tool_name.clone()).to_string(),
            }
        };

        self.finish_tool_call(call, output).await
    }

    async fn finish_tool_call(&self, call: &ToolCall, output: String) -> String {
        if let Some(post_hook) = &self.post_hook {
            post_hook.notify(&call.name, &call.arguments, &output).await;
        }
        output
    }
}

fn synthesize_tool_call(recovered: RecoveredCall) -> ToolCall {
    ToolCall {
        id: format!("recovered-{}", Uuid::new_v4()),
        name: recovered.tool_name,
        arguments: recovered.arguments,
    }
}

fn truncate(text: &str, cap: usize) -> String {
    if text.len() <= cap {
        return text.to_string();
    }
    let mut end = cap;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated {} bytes]", &text[..end], text.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{RiskLevel, Tool};
    use async_trait::async_trait as _async_trait;
    use brynhild_providers::EventStream;
    use futures::stream;
    use serde_json::json;

    struct Echo;

    #[_async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes arguments"
        }
        fn schema(&self) -> Value {
            json!({ "type": "object" })
        }
        fn risk_level(&self) -> RiskLevel {
            RiskLevel::ReadOnly
        }
        async fn execute(&self, arguments: Value) -> std::result::Result<String, String> {
            Ok(arguments.to_string())
        }
    }

    struct StaticTextProvider;

    #[_async_trait]
    impl Provider for StaticTextProvider {
        fn provider_type(&self) -> &'static str {
            "static"
        }

        async fn stream(&self, _request: ChatRequest) -> brynhild_providers::Result<EventStream> {
            let events: Vec<brynhild_providers::Result<StreamEvent>> = vec![
                Ok(StreamEvent::TextDelta { index: 0, text: "hello".into() }),
                Ok(StreamEvent::MessageStop { stop_reason: Some("end_turn".into()), usage: Usage::default() }),
            ];
            Ok(Box::pin(stream::iter(events)))
        }
    }

    #[tokio::test]
    async fn run_turn_returns_text_when_no_tool_calls() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let mut processor = ConversationProcessor::new(Some(registry), ProcessorConfig::default());
        let outcome = processor
            .run_turn(
                &StaticTextProvider,
                vec![Message::user("hi")],
                ChatRequest {
                    model: "test".into(),
                    messages: Vec::new(),
                    tools: Vec::new(),
                    temperature: None,
                    max_tokens: Some(1024),
                    reasoning: Default::default(),
                },
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.final_text, "hello");
        assert_eq!(outcome.stop_reason, "end_turn");
        assert!(!outcome.cancelled);
    }

    #[tokio::test]
    async fn run_turn_reports_max_rounds_as_terminal_outcome_not_error() {
        struct LoopingToolCallProvider;

        #[_async_trait]
        impl Provider for LoopingToolCallProvider {
            fn provider_type(&self) -> &'static str {
                "looping"
            }

            async fn stream(&self, _request: ChatRequest) -> brynhild_providers::Result<EventStream> {
                let events: Vec<brynhild_providers::Result<StreamEvent>> = vec![
                    Ok(StreamEvent::ToolUseStart { index: 0, id: "t1".into(), name: "echo".into() }),
                    Ok(StreamEvent::ToolUseDelta { index: 0, partial_json: "{}".into() }),
                    Ok(StreamEvent::MessageStop { stop_reason: Some("tool_use".into()), usage: Usage::default() }),
                ];
                Ok(Box::pin(stream::iter(events)))
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let config = ProcessorConfig { max_tool_rounds: 2, ..ProcessorConfig::default() };
        let mut processor = ConversationProcessor::new(Some(registry), config);
        let outcome = processor
            .run_turn(
                &LoopingToolCallProvider,
                vec![Message::user("hi")],
                ChatRequest {
                    model: "test".into(),
                    messages: Vec::new(),
                    tools: Vec::new(),
                    temperature: None,
                    max_tokens: Some(1024),
                    reasoning: Default::default(),
                },
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.stop_reason, "max_rounds");
        assert!(!outcome.cancelled);
        assert_eq!(outcome.rounds_used, 2);
    }

    #[tokio::test]
    async fn run_turn_honors_pre_signalled_cancellation() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let mut processor = ConversationProcessor::new(Some(registry), ProcessorConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = processor
            .run_turn(
                &StaticTextProvider,
                vec![Message::user("hi")],
                ChatRequest {
                    model: "test".into(),
                    messages: Vec::new(),
                    tools: Vec::new(),
                    temperature: None,
                    max_tokens: Some(1024),
                    reasoning: Default::default(),
                },
                Some(cancel),
                None,
            )
            .await
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.stop_reason, "cancelled");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "a".repeat(10);
        assert_eq!(truncate(&s, 100), s);
        assert!(truncate(&s, 3).starts_with("aaa"));
    }
}
