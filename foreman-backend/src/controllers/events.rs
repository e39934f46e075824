use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::events::AgentEvent;
use crate::AppState;

#[derive(Serialize)]
pub struct PublishResponse {
    pub success: bool,
    pub event_id: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/agent/event").route(web::post().to(publish)));
}

/// Accept an event for publication. Publication itself never fails; urgent
/// and high priority events kick off reactions in the background.
async fn publish(state: web::Data<AppState>, body: web::Json<AgentEvent>) -> impl Responder {
    let event_id = state.bus.publish(body.into_inner());

    HttpResponse::Ok().json(PublishResponse {
        success: true,
        event_id,
    })
}
