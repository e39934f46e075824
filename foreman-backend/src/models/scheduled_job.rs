use serde::{Deserialize, Serialize};

/// Status of a single scheduled-job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobRunStatus {
    Running,
    Completed,
    Failed,
}

impl JobRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobRunStatus::Running => "running",
            JobRunStatus::Completed => "completed",
            JobRunStatus::Failed => "failed",
        }
    }
}

/// A scheduled agent job: a fixed task string run against one department's
/// agent, either on a cron schedule or by manual trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: String,
    /// Unique job name, used for manual-run lookup
    pub name: String,
    /// 6-field cron expression (advisory - the poll loop derives next_run_at from it)
    pub schedule: String,
    pub department: String,
    pub agent_name: String,
    /// The fixed instruction sent as the sole user message
    pub task: String,
    pub enabled: bool,
    pub next_run_at: Option<String>,
    pub last_run_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Execution record for one job invocation - inserted with status=running,
/// updated exactly once at completion.
#[derive(Debug, Clone, Serialize)]
pub struct JobRun {
    pub id: String,
    pub job_name: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: String,
    pub output: Option<String>,
    pub error: Option<String>,
}

/// Result returned to the caller of a job execution
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_name: String,
    pub success: bool,
    pub output: String,
    pub duration_ms: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub name: String,
    pub schedule: String,
    pub department: String,
    pub agent_name: String,
    pub task: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}
