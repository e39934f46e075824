use crate::db::Database;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

const DEFAULT_LIMIT: usize = 20;

/// Lists tickets, optionally filtered by status.
pub struct ListTicketsTool {
    definition: ToolDefinition,
}

impl ListTicketsTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        let mut status = PropertySchema::string("Filter by ticket status");
        status.enum_values = Some(vec![
            "open".to_string(),
            "in_progress".to_string(),
            "approved".to_string(),
            "deployed".to_string(),
            "closed".to_string(),
        ]);
        properties.insert("status".to_string(), status);
        properties.insert(
            "limit".to_string(),
            PropertySchema::integer("Maximum number of tickets to return (default 20)"),
        );

        ListTicketsTool {
            definition: ToolDefinition {
                name: "list_tickets".to_string(),
                description: "List tickets, newest first, optionally filtered by status."
                    .to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec![],
                },
            },
        }
    }
}

#[async_trait]
impl Tool for ListTicketsTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, db: &Database) -> ToolResult {
        let status = params.get("status").and_then(|v| v.as_str());
        let limit = params
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_LIMIT);

        match db.list_tickets_by_status(status, limit) {
            Ok(tickets) => {
                let body = json!({ "count": tickets.len(), "tickets": tickets });
                ToolResult::success(body.to_string())
            }
            Err(e) => ToolResult::error(format!("Failed to list tickets: {}", e)),
        }
    }
}
