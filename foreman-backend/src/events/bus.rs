use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::Database;
use crate::events::types::AgentEvent;

/// Publishes inter-agent events.
///
/// Publishing never fails the caller: the audit insert is best-effort and
/// the reaction kick-off is a detached task. Urgent and high priority
/// events are forwarded to the react endpoint; everything else only lands
/// in the audit trail.
pub struct EventBus {
    db: Arc<Database>,
    client: reqwest::Client,
    react_url: String,
}

impl EventBus {
    pub fn new(db: Arc<Database>, chat_base_url: &str) -> Self {
        EventBus {
            db,
            client: reqwest::Client::new(),
            react_url: format!("{}/api/agent/react", chat_base_url),
        }
    }

    /// Publish one event. Returns the generated event id.
    pub fn publish(&self, event: AgentEvent) -> String {
        let event_id = Uuid::new_v4().to_string();

        log::info!(
            "[EVENTS] {} published {} (priority: {}, recipients: {})",
            event.from_agent,
            event.event_type.as_str(),
            event.priority.as_str(),
            if event.to_agents.is_empty() {
                "all".to_string()
            } else {
                event.to_agents.join(", ")
            }
        );

        if let Err(e) = self.db.insert_agent_event(&event_id, &event) {
            log::error!("[AUDIT] Failed to record agent event {}: {}", event_id, e);
        }
        if let Err(e) = self.db.insert_activity(
            None,
            event.event_type.as_str(),
            &format!("{} published {}", event.from_agent, event.event_type.as_str()),
            Some(&event.from_agent),
            Some(&event.payload),
        ) {
            log::error!("[AUDIT] Failed to record event activity: {}", e);
        }

        if event.priority.is_reactive() {
            let client = self.client.clone();
            let url = self.react_url.clone();
            let id = event_id.clone();
            tokio::spawn(async move {
                let result = client
                    .post(&url)
                    .json(&event)
                    .timeout(Duration::from_secs(120))
                    .send()
                    .await;
                match result {
                    Ok(response) if response.status().is_success() => {
                        log::info!("[EVENTS] Reaction dispatched for event {}", id);
                    }
                    Ok(response) => {
                        log::error!(
                            "[EVENTS] React endpoint returned HTTP {} for event {}",
                            response.status(),
                            id
                        );
                    }
                    Err(e) => {
                        log::error!("[EVENTS] Failed to reach react endpoint for event {}: {}", id, e);
                    }
                }
            });
        }

        event_id
    }
}
