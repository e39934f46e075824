use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the provider conversation. Content is either a plain
/// string or a list of typed blocks (tool_use / tool_result rounds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    pub fn user_tool_results(blocks: Vec<ContentBlock>) -> Self {
        ChatMessage {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }
}

/// One model completion: the assistant content blocks plus why it stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

impl Completion {
    /// Convenience constructor for a text-only completion.
    pub fn text(text: impl Into<String>) -> Self {
        Completion {
            content: vec![ContentBlock::Text { text: text.into() }],
            stop_reason: Some("end_turn".to_string()),
        }
    }

    /// All text blocks concatenated, in order.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// The tool_use blocks of this completion, in order.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LlmError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl LlmError {
    pub fn new(message: impl Into<String>) -> Self {
        LlmError {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status_code: u16) -> Self {
        LlmError {
            message: message.into(),
            status_code: Some(status_code),
        }
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "LLM error ({}): {}", code, self.message),
            None => write!(f, "LLM error: {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_block_serializes_with_type_tag() {
        let block = ContentBlock::ToolUse {
            id: "toolu_01".to_string(),
            name: "ticket_lookup".to_string(),
            input: json!({"ticket_id": "TCK-9"}),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["name"], "ticket_lookup");
    }

    #[test]
    fn tool_result_omits_is_error_when_false() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "toolu_01".to_string(),
            content: "{}".to_string(),
            is_error: false,
        };
        let value = serde_json::to_value(&block).unwrap();
        assert!(value.get("is_error").is_none());
    }

    #[test]
    fn text_content_concatenates_text_blocks_in_order() {
        let completion = Completion {
            content: vec![
                ContentBlock::Text { text: "first ".to_string() },
                ContentBlock::ToolUse {
                    id: "toolu_01".to_string(),
                    name: "open_deals".to_string(),
                    input: json!({}),
                },
                ContentBlock::Text { text: "second".to_string() },
            ],
            stop_reason: Some("tool_use".to_string()),
        };
        assert_eq!(completion.text_content(), "first second");
        assert_eq!(completion.tool_uses().len(), 1);
    }
}
