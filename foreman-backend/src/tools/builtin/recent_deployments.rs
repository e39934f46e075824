use crate::db::Database;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

const DEFAULT_LIMIT: usize = 10;

/// Lists the most recent deployments across all platforms.
pub struct RecentDeploymentsTool {
    definition: ToolDefinition,
}

impl RecentDeploymentsTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "limit".to_string(),
            PropertySchema::integer("Maximum number of deployments to return (default 10)"),
        );

        RecentDeploymentsTool {
            definition: ToolDefinition {
                name: "recent_deployments".to_string(),
                description: "List the most recent deployments with ticket id, platform, and status."
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
impl Tool for RecentDeploymentsTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, db: &Database) -> ToolResult {
        let limit = params
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_LIMIT);

        match db.list_recent_deployments(limit) {
            Ok(deployments) => {
                let body = json!({ "count": deployments.len(), "deployments": deployments });
                ToolResult::success(body.to_string())
            }
            Err(e) => ToolResult::error(format!("Failed to list deployments: {}", e)),
        }
    }
}
