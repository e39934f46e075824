use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::agents::ChatClient;
use crate::db::Database;
use crate::events::handlers::{HandlerRegistry, ReactionHandler};
use crate::events::types::AgentEvent;

/// Per-handler deadline. A slow or wedged agent call never blocks the
/// other reactions past this.
pub const HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

const PREVIEW_CHARS: usize = 200;

/// The outcome of one handler's reaction. Exactly one of these exists per
/// matched handler, success or not.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionOutcome {
    pub agent_name: String,
    pub department: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    /// Handlers that completed successfully
    pub reacted: usize,
    /// Handlers that matched the event
    pub total: usize,
    pub results: Vec<ReactionOutcome>,
}

/// Fans one event out to every matching reaction handler.
///
/// Handlers run concurrently, each under its own timeout. The dispatcher
/// itself never fails: every problem is captured in the handler's outcome.
pub struct ReactionDispatcher {
    chat: ChatClient,
    registry: HandlerRegistry,
    db: Arc<Database>,
    handler_timeout: Duration,
}

impl ReactionDispatcher {
    pub fn new(chat: ChatClient, registry: HandlerRegistry, db: Arc<Database>) -> Self {
        ReactionDispatcher {
            chat,
            registry,
            db,
            handler_timeout: HANDLER_TIMEOUT,
        }
    }

    /// Override the per-handler timeout (used by tests).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub async fn dispatch(&self, event: &AgentEvent) -> DispatchSummary {
        let matched = self.registry.matching(event);
        let total = matched.len();

        log::info!(
            "[REACT] {} from {} matched {} handler(s)",
            event.event_type.as_str(),
            event.from_agent,
            total
        );

        let outcomes = join_all(
            matched
                .into_iter()
                .map(|handler| self.run_handler(handler, event)),
        )
        .await;

        let reacted = outcomes.iter().filter(|o| o.success).count();
        log::info!(
            "[REACT] {} complete: {}/{} handler(s) succeeded",
            event.event_type.as_str(),
            reacted,
            total
        );

        DispatchSummary {
            reacted,
            total,
            results: outcomes,
        }
    }

    async fn run_handler(&self, handler: &ReactionHandler, event: &AgentEvent) -> ReactionOutcome {
        let prompt = (handler.build_prompt)(event);

        let outcome = match tokio::time::timeout(
            self.handler_timeout,
            self.chat.chat(handler.department, &prompt),
        )
        .await
        {
            Ok(Ok(reply)) => {
                let preview: String = reply.message.chars().take(PREVIEW_CHARS).collect();
                ReactionOutcome {
                    agent_name: handler.agent_name.to_string(),
                    department: handler.department.to_string(),
                    success: true,
                    error: None,
                    response_preview: Some(preview),
                }
            }
            Ok(Err(e)) => {
                log::error!("[REACT] {} failed to react: {}", handler.agent_name, e);
                ReactionOutcome {
                    agent_name: handler.agent_name.to_string(),
                    department: handler.department.to_string(),
                    success: false,
                    error: Some(e),
                    response_preview: None,
                }
            }
            Err(_) => {
                let message = format!(
                    "Reaction timed out after {}s",
                    self.handler_timeout.as_secs()
                );
                log::error!("[REACT] {}: {}", handler.agent_name, message);
                ReactionOutcome {
                    agent_name: handler.agent_name.to_string(),
                    department: handler.department.to_string(),
                    success: false,
                    error: Some(message),
                    response_preview: None,
                }
            }
        };

        let detail = match (&outcome.error, &outcome.response_preview) {
            (Some(err), _) => {
                format!("failed: {}", err.chars().take(PREVIEW_CHARS).collect::<String>())
            }
            (None, Some(preview)) => format!("ok: {}", preview),
            (None, None) => "ok".to_string(),
        };
        let metadata = serde_json::json!({
            "event_type": event.event_type.as_str(),
            "from_agent": event.from_agent,
            "payload": event.payload,
        });
        if let Err(e) = self.db.insert_activity(
            None,
            "reaction.completed",
            &format!(
                "{} reacted to {} from {}: {}",
                outcome.agent_name,
                event.event_type.as_str(),
                event.from_agent,
                detail
            ),
            Some(&outcome.agent_name),
            Some(&metadata),
        ) {
            log::error!("[AUDIT] Failed to record reaction activity: {}", e);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{ChatReply, MockChatClient};
    use crate::events::handlers::create_default_handlers;
    use crate::events::types::{EventPriority, EventType};
    use serde_json::json;

    fn dispatcher_with(chat: MockChatClient) -> ReactionDispatcher {
        let db = Arc::new(Database::new(":memory:").unwrap());
        ReactionDispatcher::new(
            ChatClient::Mock(chat),
            create_default_handlers(),
            db,
        )
    }

    fn event(event_type: EventType, to_agents: Vec<&str>) -> AgentEvent {
        AgentEvent {
            event_type,
            payload: json!({"ticket_id": "TCK-1042"}),
            from_agent: "Operations AI".to_string(),
            to_agents: to_agents.into_iter().map(String::from).collect(),
            priority: EventPriority::High,
        }
    }

    #[tokio::test]
    async fn each_matched_handler_produces_one_outcome() {
        let chat = MockChatClient::new();
        chat.queue_reply("engineering", Ok(ChatReply::text("On it.")));
        chat.queue_reply("delivery", Ok(ChatReply::text("Scheduling.")));
        let dispatcher = dispatcher_with(chat.clone());

        let summary = dispatcher
            .dispatch(&event(
                EventType::TicketApproved,
                vec!["Engineering AI", "Delivery AI"],
            ))
            .await;

        assert_eq!(summary.total, 2);
        assert_eq!(summary.reacted, 2);
        assert_eq!(summary.results.len(), 2);
        assert_eq!(chat.calls().len(), 2);
    }

    #[tokio::test]
    async fn no_matching_handler_yields_empty_summary() {
        let chat = MockChatClient::new();
        let dispatcher = dispatcher_with(chat.clone());

        // automation.error only routes to Engineering AI
        let summary = dispatcher
            .dispatch(&event(EventType::AutomationError, vec!["Sales AI"]))
            .await;

        assert_eq!(summary.total, 0);
        assert_eq!(summary.reacted, 0);
        assert!(summary.results.is_empty());
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn one_slow_handler_times_out_without_sinking_the_rest() {
        let chat = MockChatClient::new();
        chat.queue_delayed_reply(
            "engineering",
            Duration::from_secs(5),
            Ok(ChatReply::text("Too late.")),
        );
        chat.queue_reply("delivery", Ok(ChatReply::text("Scheduling.")));
        let dispatcher =
            dispatcher_with(chat).with_timeout(Duration::from_millis(100));

        let summary = dispatcher
            .dispatch(&event(
                EventType::TicketApproved,
                vec!["Engineering AI", "Delivery AI"],
            ))
            .await;

        assert_eq!(summary.total, 2);
        assert_eq!(summary.reacted, 1);

        let eng = summary
            .results
            .iter()
            .find(|o| o.agent_name == "Engineering AI")
            .unwrap();
        assert!(!eng.success);
        assert!(eng.error.as_deref().unwrap().contains("timed out"));

        let delivery = summary
            .results
            .iter()
            .find(|o| o.agent_name == "Delivery AI")
            .unwrap();
        assert!(delivery.success);
        assert_eq!(delivery.response_preview.as_deref(), Some("Scheduling."));
    }

    #[tokio::test]
    async fn handler_chat_error_is_captured_in_outcome() {
        let chat = MockChatClient::new();
        chat.queue_reply("engineering", Err("upstream unavailable".to_string()));
        let dispatcher = dispatcher_with(chat);

        let summary = dispatcher
            .dispatch(&event(EventType::AutomationError, vec!["Engineering AI"]))
            .await;

        assert_eq!(summary.total, 1);
        assert_eq!(summary.reacted, 0);
        assert_eq!(
            summary.results[0].error.as_deref(),
            Some("upstream unavailable")
        );
    }

    #[tokio::test]
    async fn reaction_audit_row_carries_response_and_event_metadata() {
        let chat = MockChatClient::new();
        chat.queue_reply("engineering", Ok(ChatReply::text("Rolling back the deploy.")));
        let db = Arc::new(Database::new(":memory:").unwrap());
        let dispatcher = ReactionDispatcher::new(
            ChatClient::Mock(chat),
            create_default_handlers(),
            db.clone(),
        );

        dispatcher
            .dispatch(&event(EventType::AutomationError, vec!["Engineering AI"]))
            .await;

        let rows = db.list_recent_activity(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_type, "reaction.completed");
        assert!(rows[0].message.contains("ok: Rolling back the deploy."));
        let metadata = rows[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["event_type"], "automation.error");
        assert_eq!(metadata["payload"]["ticket_id"], "TCK-1042");
    }
}
