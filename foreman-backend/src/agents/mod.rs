pub mod chat_client;
pub mod conversation;
pub mod departments;

#[cfg(test)]
mod conversation_tests;

pub use chat_client::{ChatClient, ChatReply, MockChatClient};
pub use conversation::{ChatError, ChatOutcome, ConversationLoop, ToolEvent, MAX_ITERATIONS};
pub use departments::{department_for_agent, get_department, DepartmentConfig, DEPARTMENTS};
