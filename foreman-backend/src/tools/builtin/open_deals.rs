use crate::db::Database;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

const DEFAULT_LIMIT: usize = 20;

/// Lists deals that have not closed yet, newest first.
pub struct OpenDealsTool {
    definition: ToolDefinition,
}

impl OpenDealsTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "limit".to_string(),
            PropertySchema::integer("Maximum number of deals to return (default 20)"),
        );

        OpenDealsTool {
            definition: ToolDefinition {
                name: "open_deals".to_string(),
                description: "List open sales deals (not yet won or lost), newest first. \
                              Returns deal id, client name, stage, and value in cents."
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
impl Tool for OpenDealsTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, db: &Database) -> ToolResult {
        let limit = params
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_LIMIT);

        match db.list_open_deals(limit) {
            Ok(deals) => {
                let body = json!({ "count": deals.len(), "deals": deals });
                ToolResult::success(body.to_string())
            }
            Err(e) => ToolResult::error(format!("Failed to list open deals: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_only_unclosed_deals() {
        let db = Database::new(":memory:").unwrap();
        db.insert_deal("D-1", "Acme", "proposal", 500_000).unwrap();
        db.insert_deal("D-2", "Globex", "closed_won", 900_000).unwrap();
        db.insert_deal("D-3", "Initech", "negotiation", 120_000).unwrap();

        let result = OpenDealsTool::new().execute(json!({}), &db).await;
        assert!(result.success);

        let body: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(body["count"], 2);
        let ids: Vec<&str> = body["deals"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"D-1"));
        assert!(ids.contains(&"D-3"));
    }
}
