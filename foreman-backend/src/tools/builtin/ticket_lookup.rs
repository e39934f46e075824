use crate::db::Database;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Fetches a single ticket by id.
pub struct TicketLookupTool {
    definition: ToolDefinition,
}

impl TicketLookupTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "ticket_id".to_string(),
            PropertySchema::string("Ticket id, e.g. TCK-1042"),
        );

        TicketLookupTool {
            definition: ToolDefinition {
                name: "ticket_lookup".to_string(),
                description: "Fetch one ticket by id, including client, platform, status, and summary."
                    .to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["ticket_id".to_string()],
                },
            },
        }
    }
}

#[async_trait]
impl Tool for TicketLookupTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, db: &Database) -> ToolResult {
        let ticket_id = match params.get("ticket_id").and_then(|v| v.as_str()) {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return ToolResult::error("Missing required parameter: ticket_id"),
        };

        match db.get_ticket(&ticket_id) {
            Ok(Some(ticket)) => ToolResult::success(ticket.to_string()),
            Ok(None) => ToolResult::error(format!("Ticket not found: {}", ticket_id)),
            Err(e) => ToolResult::error(format!("Ticket lookup failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_ticket_is_an_error_result() {
        let db = Database::new(":memory:").unwrap();
        let result = TicketLookupTool::new()
            .execute(json!({"ticket_id": "TCK-404"}), &db)
            .await;
        assert!(!result.success);
        assert!(result.content.contains("TCK-404"));
    }
}
