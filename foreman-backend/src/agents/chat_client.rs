use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Reply from a department agent, as returned by the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub tool_events: Vec<serde_json::Value>,
}

impl ChatReply {
    pub fn text(message: impl Into<String>) -> Self {
        ChatReply {
            message: message.into(),
            tool_events: vec![],
        }
    }

}

#[derive(Debug, Deserialize)]
struct ChatEndpointResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "toolEvents", default)]
    tool_events: Vec<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the chat endpoint, used by the reaction dispatcher and
/// the job runner so agent-to-agent calls go through the exact same path
/// as user traffic.
#[derive(Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpChatClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn chat(&self, department: &str, message: &str) -> Result<ChatReply, String> {
        let url = format!("{}/api/agent/chat", self.base_url);
        let body = serde_json::json!({
            "department": department,
            "messages": [{"role": "user", "content": message}],
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Chat request failed: {}", e))?;

        let status = response.status();
        let parsed: ChatEndpointResponse = response
            .json()
            .await
            .map_err(|e| format!("Chat response parse failed (HTTP {}): {}", status, e))?;

        if !parsed.success {
            return Err(parsed
                .error
                .unwrap_or_else(|| format!("Chat endpoint returned HTTP {}", status)));
        }

        Ok(ChatReply {
            message: parsed.message.unwrap_or_default(),
            tool_events: parsed.tool_events,
        })
    }
}

/// One queued mock reply, with an optional artificial delay so tests can
/// exercise the dispatcher and job-runner timeouts.
pub struct QueuedReply {
    pub delay: Duration,
    pub result: Result<ChatReply, String>,
}

/// Mock chat client for tests. Replies are queued per department.
#[derive(Clone, Default)]
pub struct MockChatClient {
    replies: Arc<Mutex<HashMap<String, VecDeque<QueuedReply>>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, department: &str, result: Result<ChatReply, String>) {
        self.queue_delayed_reply(department, Duration::ZERO, result);
    }

    pub fn queue_delayed_reply(
        &self,
        department: &str,
        delay: Duration,
        result: Result<ChatReply, String>,
    ) {
        self.replies
            .lock()
            .unwrap()
            .entry(department.to_string())
            .or_default()
            .push_back(QueuedReply { delay, result });
    }

    /// Every (department, message) pair this client was asked to handle.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    async fn chat(&self, department: &str, message: &str) -> Result<ChatReply, String> {
        self.calls
            .lock()
            .unwrap()
            .push((department.to_string(), message.to_string()));

        let queued = self
            .replies
            .lock()
            .unwrap()
            .get_mut(department)
            .and_then(|q| q.pop_front());

        match queued {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => Ok(ChatReply::text("(mock exhausted)")),
        }
    }
}

/// Client used wherever one component needs to talk to a department agent.
#[derive(Clone)]
pub enum ChatClient {
    Http(HttpChatClient),
    Mock(MockChatClient),
}

impl ChatClient {
    pub fn http(base_url: impl Into<String>) -> Self {
        ChatClient::Http(HttpChatClient::new(base_url))
    }

    pub async fn chat(&self, department: &str, message: &str) -> Result<ChatReply, String> {
        match self {
            ChatClient::Http(client) => client.chat(department, message).await,
            ChatClient::Mock(client) => client.chat(department, message).await,
        }
    }
}
