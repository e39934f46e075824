use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::models::ActivityEntry;
use crate::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ActivityResponse {
    pub success: bool,
    pub activity: Vec<ActivityEntry>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/activity").route(web::get().to(list_activity)));
}

async fn list_activity(
    state: web::Data<AppState>,
    query: web::Query<ActivityQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    match state.db.list_recent_activity(limit) {
        Ok(activity) => HttpResponse::Ok().json(ActivityResponse {
            success: true,
            activity,
        }),
        Err(e) => {
            log::error!("[ACTIVITY] Failed to read activity log: {}", e);
            HttpResponse::InternalServerError().json(ActivityResponse {
                success: false,
                activity: vec![],
            })
        }
    }
}
