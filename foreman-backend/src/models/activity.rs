use serde::Serialize;
use serde_json::Value;

/// One row of the shared activity/audit log.
///
/// Every component writes here best-effort: tool executions, reaction
/// outcomes, job runs, published events. Losing a row never fails a caller.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    /// Optional reference to the business entity this relates to (ticket id, job name, ...)
    pub entity_ref: Option<String>,
    pub event_type: String,
    pub message: String,
    pub agent_name: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: String,
}
