use serde_json::Value;
use std::collections::HashMap;

use crate::events::types::{AgentEvent, EventType};

/// A registered reaction: which agent reacts to an event type, and how the
/// reaction prompt is built from the event.
pub struct ReactionHandler {
    pub department: &'static str,
    pub agent_name: &'static str,
    pub build_prompt: fn(&AgentEvent) -> String,
}

/// Registry of reaction handlers, keyed by event type.
pub struct HandlerRegistry {
    handlers: HashMap<EventType, Vec<ReactionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        HandlerRegistry {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, event_type: EventType, handler: ReactionHandler) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Handlers that should react to this event: registered for its type
    /// and named in toAgents (exact set-membership). An event that names
    /// nobody matches nothing.
    pub fn matching(&self, event: &AgentEvent) -> Vec<&ReactionHandler> {
        self.handlers
            .get(&event.event_type)
            .map(|handlers| {
                handlers
                    .iter()
                    .filter(|h| event.to_agents.iter().any(|a| a == h.agent_name))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn payload_summary(payload: &Value) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string())
}

/// The default reaction wiring between department agents.
pub fn create_default_handlers() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(
        EventType::TicketApproved,
        ReactionHandler {
            department: "engineering",
            agent_name: "Engineering AI",
            build_prompt: |event| {
                format!(
                    "A ticket was just approved by {}. Review it, confirm it is ready to build, \
                     and flag anything blocking. Event payload: {}",
                    event.from_agent,
                    payload_summary(&event.payload)
                )
            },
        },
    );
    registry.register(
        EventType::TicketApproved,
        ReactionHandler {
            department: "delivery",
            agent_name: "Delivery AI",
            build_prompt: |event| {
                format!(
                    "A ticket was approved and will enter the build queue. Prepare the delivery \
                     plan and client update. Event payload: {}",
                    payload_summary(&event.payload)
                )
            },
        },
    );

    registry.register(
        EventType::TicketDeployed,
        ReactionHandler {
            department: "delivery",
            agent_name: "Delivery AI",
            build_prompt: |event| {
                format!(
                    "A ticket was deployed. Verify the deployment looks healthy and draft the \
                     client notification. Event payload: {}",
                    payload_summary(&event.payload)
                )
            },
        },
    );
    registry.register(
        EventType::TicketDeployed,
        ReactionHandler {
            department: "sales",
            agent_name: "Sales AI",
            build_prompt: |event| {
                format!(
                    "Work for a client just shipped. Check whether this opens an upsell or \
                     follow-up conversation. Event payload: {}",
                    payload_summary(&event.payload)
                )
            },
        },
    );

    registry.register(
        EventType::DealClosed,
        ReactionHandler {
            department: "sales",
            agent_name: "Sales AI",
            build_prompt: |event| {
                format!(
                    "A deal just closed. Record the outcome and line up the kickoff handover. \
                     Event payload: {}",
                    payload_summary(&event.payload)
                )
            },
        },
    );
    registry.register(
        EventType::DealClosed,
        ReactionHandler {
            department: "operations",
            agent_name: "Operations AI",
            build_prompt: |event| {
                format!(
                    "A deal closed, which changes upcoming workload. Reassess capacity and \
                     scheduling. Event payload: {}",
                    payload_summary(&event.payload)
                )
            },
        },
    );

    registry.register(
        EventType::AutomationError,
        ReactionHandler {
            department: "engineering",
            agent_name: "Engineering AI",
            build_prompt: |event| {
                format!(
                    "An automation reported an error from {}. Investigate the failure and \
                     propose a fix. Event payload: {}",
                    event.from_agent,
                    payload_summary(&event.payload)
                )
            },
        },
    );

    registry.register(
        EventType::ClientAtRisk,
        ReactionHandler {
            department: "sales",
            agent_name: "Sales AI",
            build_prompt: |event| {
                format!(
                    "A client was flagged at risk. Review their history and draft a retention \
                     plan. Event payload: {}",
                    payload_summary(&event.payload)
                )
            },
        },
    );
    registry.register(
        EventType::ClientAtRisk,
        ReactionHandler {
            department: "operations",
            agent_name: "Operations AI",
            build_prompt: |event| {
                format!(
                    "A client was flagged at risk. Check for delivery problems on our side that \
                     may be driving it. Event payload: {}",
                    payload_summary(&event.payload)
                )
            },
        },
    );

    registry
}
