use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::agents::get_department;
use crate::models::{CreateJobRequest, JobRun, ScheduledJob};
use crate::scheduler::{next_run_after_now, validate_schedule};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RunJobRequest {
    /// Name of the job to run now, ahead of its schedule
    pub job: String,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<ScheduledJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub success: bool,
    pub jobs: Vec<ScheduledJob>,
}

#[derive(Serialize)]
pub struct JobRunListResponse {
    pub success: bool,
    pub runs: Vec<JobRun>,
}

#[derive(Serialize)]
pub struct RunJobResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    pub output: String,
    pub duration_ms: i64,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/scheduler/run").route(web::post().to(run_job)))
        .service(
            web::resource("/api/scheduler/jobs")
                .route(web::get().to(list_jobs))
                .route(web::post().to(create_job)),
        )
        .service(
            web::resource("/api/scheduler/jobs/{name}")
                .route(web::delete().to(delete_job)),
        )
        .service(web::resource("/api/scheduler/jobs/{name}/toggle").route(web::post().to(toggle_job)))
        .service(web::resource("/api/scheduler/jobs/{name}/runs").route(web::get().to(list_runs)));
}

/// Manual run by job name. Unknown or disabled jobs are reported as
/// success:false with a descriptive output, not as an HTTP error.
async fn run_job(state: web::Data<AppState>, body: web::Json<RunJobRequest>) -> impl Responder {
    match state.runner.run_job_by_name(&body.job).await {
        Ok(result) => HttpResponse::Ok().json(RunJobResponse {
            success: result.success,
            job_name: Some(result.job_name),
            output: result.output,
            duration_ms: result.duration_ms,
        }),
        Err(e) => HttpResponse::Ok().json(RunJobResponse {
            success: false,
            job_name: None,
            output: e,
            duration_ms: 0,
        }),
    }
}

async fn list_jobs(state: web::Data<AppState>) -> impl Responder {
    match state.db.list_jobs() {
        Ok(jobs) => HttpResponse::Ok().json(JobListResponse {
            success: true,
            jobs,
        }),
        Err(e) => {
            log::error!("[SCHEDULER] Failed to list jobs: {}", e);
            HttpResponse::InternalServerError().json(JobListResponse {
                success: false,
                jobs: vec![],
            })
        }
    }
}

async fn create_job(
    state: web::Data<AppState>,
    body: web::Json<CreateJobRequest>,
) -> impl Responder {
    if let Err(e) = validate_schedule(&body.schedule) {
        return HttpResponse::BadRequest().json(JobResponse {
            success: false,
            job: None,
            error: Some(e),
        });
    }
    if get_department(&body.department).is_none() {
        return HttpResponse::BadRequest().json(JobResponse {
            success: false,
            job: None,
            error: Some(format!("Unknown department: {}", body.department)),
        });
    }
    if body.name.trim().is_empty() || body.task.trim().is_empty() {
        return HttpResponse::BadRequest().json(JobResponse {
            success: false,
            job: None,
            error: Some("name and task must not be empty".to_string()),
        });
    }

    let next_run = next_run_after_now(&body.schedule).map(|dt| dt.to_rfc3339());
    match state.db.create_job(
        body.name.trim(),
        &body.schedule,
        &body.department,
        &body.agent_name,
        &body.task,
        body.enabled,
        next_run.as_deref(),
    ) {
        Ok(job) => {
            log::info!("[SCHEDULER] Created job '{}' ({})", job.name, job.schedule);
            HttpResponse::Ok().json(JobResponse {
                success: true,
                job: Some(job),
                error: None,
            })
        }
        Err(e) => HttpResponse::InternalServerError().json(JobResponse {
            success: false,
            job: None,
            error: Some(format!("Failed to create job: {}", e)),
        }),
    }
}

async fn delete_job(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();

    match state.db.delete_job(&name) {
        Ok(true) => {
            log::info!("[SCHEDULER] Deleted job '{}'", name);
            HttpResponse::Ok().json(JobResponse {
                success: true,
                job: None,
                error: None,
            })
        }
        Ok(false) => HttpResponse::NotFound().json(JobResponse {
            success: false,
            job: None,
            error: Some(format!("Job not found: {}", name)),
        }),
        Err(e) => HttpResponse::InternalServerError().json(JobResponse {
            success: false,
            job: None,
            error: Some(format!("Failed to delete job: {}", e)),
        }),
    }
}

async fn toggle_job(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();

    let job = match state.db.get_job_by_name(&name) {
        Ok(Some(job)) => job,
        Ok(None) => {
            return HttpResponse::NotFound().json(JobResponse {
                success: false,
                job: None,
                error: Some(format!("Job not found: {}", name)),
            });
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(JobResponse {
                success: false,
                job: None,
                error: Some(format!("Database error: {}", e)),
            });
        }
    };

    let enabled = !job.enabled;
    match state.db.set_job_enabled(&name, enabled) {
        Ok(_) => {
            log::info!("[SCHEDULER] Job '{}' {}", name, if enabled { "enabled" } else { "disabled" });
            let job = state.db.get_job_by_name(&name).ok().flatten();
            HttpResponse::Ok().json(JobResponse {
                success: true,
                job,
                error: None,
            })
        }
        Err(e) => HttpResponse::InternalServerError().json(JobResponse {
            success: false,
            job: None,
            error: Some(format!("Failed to toggle job: {}", e)),
        }),
    }
}

async fn list_runs(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();

    match state.db.list_job_runs(&name, 50) {
        Ok(runs) => HttpResponse::Ok().json(JobRunListResponse {
            success: true,
            runs,
        }),
        Err(e) => {
            log::error!("[SCHEDULER] Failed to list runs for '{}': {}", name, e);
            HttpResponse::InternalServerError().json(JobRunListResponse {
                success: false,
                runs: vec![],
            })
        }
    }
}
