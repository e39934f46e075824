use crate::db::Database;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

const DEFAULT_LIMIT: usize = 25;

/// Recent entries from the shared activity log, for cross-department
/// situational awareness.
pub struct ActivitySummaryTool {
    definition: ToolDefinition,
}

impl ActivitySummaryTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "limit".to_string(),
            PropertySchema::integer("Maximum number of activity entries to return (default 25)"),
        );

        ActivitySummaryTool {
            definition: ToolDefinition {
                name: "activity_summary".to_string(),
                description: "Summarize recent activity across departments: events, reactions, \
                              and job runs, newest first."
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
impl Tool for ActivitySummaryTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, db: &Database) -> ToolResult {
        let limit = params
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_LIMIT);

        match db.list_recent_activity(limit) {
            Ok(entries) => {
                let body = json!({ "count": entries.len(), "activity": entries });
                ToolResult::success(body.to_string())
            }
            Err(e) => ToolResult::error(format!("Failed to read activity log: {}", e)),
        }
    }
}
