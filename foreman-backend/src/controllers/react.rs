use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::events::{AgentEvent, ReactionOutcome};
use crate::AppState;

#[derive(Serialize)]
pub struct ReactResponse {
    pub success: bool,
    /// Handlers that completed successfully
    pub reacted: usize,
    /// Handlers that matched the event
    pub total: usize,
    pub results: Vec<ReactionOutcome>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/agent/react").route(web::post().to(react)));
}

/// Run every matching reaction handler for an event. Always 200 for a
/// well-formed event; individual handler failures are reported per-result.
/// (Malformed JSON is rejected by the extractor before we get here.)
async fn react(state: web::Data<AppState>, body: web::Json<AgentEvent>) -> impl Responder {
    let summary = state.dispatcher.dispatch(&body).await;

    HttpResponse::Ok().json(ReactResponse {
        success: true,
        reacted: summary.reacted,
        total: summary.total,
        results: summary.results,
    })
}
