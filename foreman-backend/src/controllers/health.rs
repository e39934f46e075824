use actix_web::{web, HttpResponse, Responder};

use crate::agents::DEPARTMENTS;
use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_ok = state.db.count_conversations().is_ok();

    HttpResponse::Ok().json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "version": VERSION,
        "departments": DEPARTMENTS.iter().map(|d| d.key).collect::<Vec<_>>(),
        "scheduler_enabled": state.config.scheduler_enabled,
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
