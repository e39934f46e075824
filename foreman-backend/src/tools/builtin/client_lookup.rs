use crate::db::Database;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Everything known about one client: deals and tickets, by name.
pub struct ClientLookupTool {
    definition: ToolDefinition,
}

impl ClientLookupTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "client_name".to_string(),
            PropertySchema::string("Exact client name to look up (case-insensitive)"),
        );

        ClientLookupTool {
            definition: ToolDefinition {
                name: "client_lookup".to_string(),
                description: "Look up a client by name and return their deals and tickets."
                    .to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["client_name".to_string()],
                },
            },
        }
    }
}

#[async_trait]
impl Tool for ClientLookupTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, db: &Database) -> ToolResult {
        let client_name = match params.get("client_name").and_then(|v| v.as_str()) {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => return ToolResult::error("Missing required parameter: client_name"),
        };

        match db.lookup_client(&client_name) {
            Ok(profile) => ToolResult::success(profile.to_string()),
            Err(e) => ToolResult::error(format!("Client lookup failed: {}", e)),
        }
    }
}
