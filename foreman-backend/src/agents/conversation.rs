use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::agents::departments::{get_department, DepartmentConfig};
use crate::db::Database;
use crate::llm::{ChatMessage, ContentBlock, LlmClient, LlmError, MessageContent, Role};
use crate::tools::{ToolRegistry, ToolResult};

/// Hard cap on model round-trips per conversation. The loop always
/// terminates: either the model stops requesting tools or we cut it off here.
pub const MAX_ITERATIONS: usize = 8;

/// One tool invocation as seen by the caller: what was asked, what came
/// back, how long it took. Failures are embedded as {"error": ...} in
/// tool_result rather than surfaced as errors.
#[derive(Debug, Clone, Serialize)]
pub struct ToolEvent {
    pub tool_name: String,
    pub tool_input: Value,
    pub tool_result: Value,
    pub duration_ms: i64,
}

/// Result of a completed conversation run.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub message: String,
    pub tool_events: Vec<ToolEvent>,
}

#[derive(Debug, Clone)]
pub enum ChatError {
    UnknownDepartment(String),
    InvalidInput(String),
    Upstream(LlmError),
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::UnknownDepartment(key) => write!(f, "Unknown department: {}", key),
            ChatError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ChatError::Upstream(e) => write!(f, "{}", e),
        }
    }
}

/// The agentic tool-calling loop for one department agent.
///
/// Each iteration sends the full conversation to the model. When the model
/// requests tools, all requested tools run concurrently, the results go back
/// as a synthetic user message, and the loop continues. The final text is
/// the text of the last completion that carried any.
pub struct ConversationLoop {
    llm: LlmClient,
    registry: Arc<ToolRegistry>,
    db: Arc<Database>,
}

impl ConversationLoop {
    pub fn new(llm: LlmClient, registry: Arc<ToolRegistry>, db: Arc<Database>) -> Self {
        ConversationLoop { llm, registry, db }
    }

    pub async fn run(
        &self,
        department_key: &str,
        history: Vec<ChatMessage>,
    ) -> Result<ChatOutcome, ChatError> {
        let dept = get_department(department_key)
            .ok_or_else(|| ChatError::UnknownDepartment(department_key.to_string()))?;

        // The history must be non-empty and end with a user turn.
        let user_message = match history.last() {
            None => {
                return Err(ChatError::InvalidInput("messages must not be empty".to_string()));
            }
            Some(msg) if msg.role != Role::User => {
                return Err(ChatError::InvalidInput(
                    "messages must end with a user turn".to_string(),
                ));
            }
            Some(msg) => match &msg.content {
                MessageContent::Text(text) if text.trim().is_empty() => {
                    return Err(ChatError::InvalidInput("message must not be empty".to_string()));
                }
                MessageContent::Text(text) => text.trim().to_string(),
                MessageContent::Blocks(_) => String::new(),
            },
        };

        log::info!(
            "[CHAT] {} handling conversation ({} message(s))",
            dept.agent_name,
            history.len()
        );

        let tools = self.registry.definitions_for(dept.tools);
        let mut messages = history;
        let mut tool_events: Vec<ToolEvent> = Vec::new();
        let mut final_text = String::new();

        for iteration in 1..=MAX_ITERATIONS {
            let completion = self
                .llm
                .complete(dept.system_prompt, &messages, &tools)
                .await
                .map_err(ChatError::Upstream)?;

            let text = completion.text_content();
            if !text.is_empty() {
                // Last text wins across iterations
                final_text = text;
            }

            let tool_uses: Vec<(String, String, Value)> = completion
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            if tool_uses.is_empty() {
                log::info!(
                    "[CHAT] {} finished after {} iteration(s), {} tool call(s)",
                    dept.agent_name,
                    iteration,
                    tool_events.len()
                );
                self.audit_conversation(dept, &user_message, &final_text, &tool_events);
                return Ok(ChatOutcome {
                    message: final_text,
                    tool_events,
                });
            }

            log::info!(
                "[CHAT] Iteration {}/{}: {} running {} tool(s): {}",
                iteration,
                MAX_ITERATIONS,
                dept.agent_name,
                tool_uses.len(),
                tool_uses
                    .iter()
                    .map(|(_, name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            // Run every requested tool concurrently; results re-keyed by
            // invocation id so completion order never matters.
            let mut pending = FuturesUnordered::new();
            for (id, name, input) in &tool_uses {
                let registry = &self.registry;
                let db = &self.db;
                // Departments only get to call the tools they declare.
                let allowed = dept.tools.contains(&name.as_str());
                pending.push(async move {
                    let started = Instant::now();
                    let result = if allowed {
                        registry.execute(name, input.clone(), db).await
                    } else {
                        ToolResult::error(format!("Tool not found: {}", name))
                    };
                    (id.clone(), result, started.elapsed().as_millis() as i64)
                });
            }

            let mut results = HashMap::new();
            while let Some((id, result, duration_ms)) = pending.next().await {
                results.insert(id, (result, duration_ms));
            }

            // Record events and build the synthetic tool_result message in
            // the order the model requested the tools.
            let mut result_blocks = Vec::with_capacity(tool_uses.len());
            for (id, name, input) in &tool_uses {
                let (result, duration_ms) = match results.remove(id) {
                    Some(entry) => entry,
                    None => continue,
                };
                let result_json = result.result_json();

                self.audit_tool_execution(dept, name, input, &result, duration_ms);
                tool_events.push(ToolEvent {
                    tool_name: name.clone(),
                    tool_input: input.clone(),
                    tool_result: result_json.clone(),
                    duration_ms,
                });

                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: result_json.to_string(),
                    is_error: !result.success,
                });
            }

            messages.push(ChatMessage::assistant_blocks(completion.content));
            messages.push(ChatMessage::user_tool_results(result_blocks));
        }

        log::warn!(
            "[CHAT] {} hit the {}-iteration cap, returning last text",
            dept.agent_name,
            MAX_ITERATIONS
        );
        self.audit_conversation(dept, &user_message, &final_text, &tool_events);
        Ok(ChatOutcome {
            message: final_text,
            tool_events,
        })
    }

    /// Best-effort audit write. Failures are logged and never propagate.
    fn audit_tool_execution(
        &self,
        dept: &DepartmentConfig,
        tool_name: &str,
        input: &Value,
        result: &ToolResult,
        duration_ms: i64,
    ) {
        let db = self.db.clone();
        let department = dept.key.to_string();
        let tool_name = tool_name.to_string();
        let input = input.clone();
        let success = result.success;
        let content = result.content.clone();
        tokio::spawn(async move {
            if let Err(e) = db.log_tool_execution(
                &department,
                &tool_name,
                &input,
                success,
                Some(&content),
                duration_ms,
            ) {
                log::error!("[AUDIT] Failed to record tool execution: {}", e);
            }
        });
    }

    /// Best-effort audit write. Failures are logged and never propagate.
    fn audit_conversation(
        &self,
        dept: &DepartmentConfig,
        user_message: &str,
        final_text: &str,
        tool_events: &[ToolEvent],
    ) {
        let db = self.db.clone();
        let department = dept.key.to_string();
        let agent_name = dept.agent_name.to_string();
        let user_message = user_message.to_string();
        let final_text = final_text.to_string();
        let events_json = json!(tool_events);
        tokio::spawn(async move {
            if let Err(e) =
                db.insert_conversation(&department, &user_message, &final_text, &events_json)
            {
                log::error!("[AUDIT] Failed to record conversation: {}", e);
            }
            if let Err(e) = db.insert_activity(
                None,
                "conversation.completed",
                &format!("{} answered a {} chars message", agent_name, user_message.len()),
                Some(&agent_name),
                None,
            ) {
                log::error!("[AUDIT] Failed to record activity: {}", e);
            }
        });
    }
}
