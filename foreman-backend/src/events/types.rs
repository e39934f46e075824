use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of inter-agent event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "ticket.approved")]
    TicketApproved,
    #[serde(rename = "ticket.deployed")]
    TicketDeployed,
    #[serde(rename = "deal.closed")]
    DealClosed,
    #[serde(rename = "automation.error")]
    AutomationError,
    #[serde(rename = "client.at_risk")]
    ClientAtRisk,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TicketApproved => "ticket.approved",
            EventType::TicketDeployed => "ticket.deployed",
            EventType::DealClosed => "deal.closed",
            EventType::AutomationError => "automation.error",
            EventType::ClientAtRisk => "client.at_risk",
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventPriority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl EventPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPriority::Urgent => "urgent",
            EventPriority::High => "high",
            EventPriority::Normal => "normal",
            EventPriority::Low => "low",
        }
    }

    /// Only urgent and high priority events trigger immediate reactions.
    pub fn is_reactive(&self) -> bool {
        matches!(self, EventPriority::Urgent | EventPriority::High)
    }
}

/// An inter-agent event. Wire format uses camelCase for the routing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: Value,
    #[serde(rename = "fromAgent")]
    pub from_agent: String,
    /// Explicit recipients. Handlers are matched by set-membership, so an
    /// empty list dispatches to nobody.
    #[serde(rename = "toAgents", default)]
    pub to_agents: Vec<String>,
    #[serde(default)]
    pub priority: EventPriority,
}
