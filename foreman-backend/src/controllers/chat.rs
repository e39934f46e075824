use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::ChatError;
use crate::llm::ChatMessage;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub department: String,
    /// Full message history; must end with a user turn.
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "toolEvents", skip_serializing_if = "Vec::is_empty")]
    pub tool_events: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/agent/chat").route(web::post().to(chat)));
}

async fn chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> impl Responder {
    let ChatRequest { department, messages } = body.into_inner();
    match state.conversation.run(&department, messages).await {
        Ok(outcome) => HttpResponse::Ok().json(ChatResponse {
            success: true,
            message: Some(outcome.message),
            tool_events: outcome
                .tool_events
                .iter()
                .filter_map(|e| serde_json::to_value(e).ok())
                .collect(),
            error: None,
        }),
        Err(e @ (ChatError::UnknownDepartment(_) | ChatError::InvalidInput(_))) => {
            HttpResponse::BadRequest().json(ChatResponse {
                success: false,
                message: None,
                tool_events: vec![],
                error: Some(e.to_string()),
            })
        }
        Err(ChatError::Upstream(e)) => {
            log::error!("[CHAT] Upstream model failure: {}", e);
            HttpResponse::BadGateway().json(ChatResponse {
                success: false,
                message: None,
                tool_events: vec![],
                error: Some(e.to_string()),
            })
        }
    }
}
