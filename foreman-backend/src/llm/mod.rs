pub mod anthropic;
pub mod types;

pub use anthropic::AnthropicClient;
pub use types::{ChatMessage, Completion, ContentBlock, LlmError, MessageContent, Role};

use crate::config::Config;
use crate::tools::ToolDefinition;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded model call: what went in, what came out. Captured by the
/// mock client so tests can audit every iteration of the loop.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub iteration: usize,
    pub input_system: String,
    pub input_messages: Vec<ChatMessage>,
    pub input_tools: Vec<String>,
    pub output: Result<Completion, LlmError>,
}

/// Mock LLM client for tests. Returns pre-configured completions from a
/// queue and records a trace entry per call.
#[derive(Clone)]
pub struct MockLlmClient {
    completions: Arc<Mutex<VecDeque<Result<Completion, LlmError>>>>,
    trace: Arc<Mutex<Vec<TraceEntry>>>,
}

impl MockLlmClient {
    pub fn new(completions: Vec<Result<Completion, LlmError>>) -> Self {
        MockLlmClient {
            completions: Arc::new(Mutex::new(VecDeque::from(completions))),
            trace: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn next_completion_traced(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion, LlmError> {
        let result = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::text("(mock exhausted)")));

        let mut trace = self.trace.lock().unwrap();
        let entry = TraceEntry {
            iteration: trace.len() + 1,
            input_system: system.to_string(),
            input_messages: messages.to_vec(),
            input_tools: tools.iter().map(|t| t.name.clone()).collect(),
            output: result.clone(),
        };
        trace.push(entry);
        result
    }

    pub fn get_trace(&self) -> Vec<TraceEntry> {
        self.trace.lock().unwrap().clone()
    }
}

/// Unified LLM client over the configured provider.
#[derive(Clone)]
pub enum LlmClient {
    Anthropic(AnthropicClient),
    Mock(MockLlmClient),
}

impl LlmClient {
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let client = AnthropicClient::new(
            &config.llm_api_key,
            &config.llm_endpoint,
            &config.llm_model,
            config.llm_max_tokens,
        )?;
        Ok(LlmClient::Anthropic(client))
    }

    pub async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion, LlmError> {
        match self {
            LlmClient::Anthropic(client) => client.complete(system, messages, tools).await,
            LlmClient::Mock(client) => client.next_completion_traced(system, messages, tools),
        }
    }
}
