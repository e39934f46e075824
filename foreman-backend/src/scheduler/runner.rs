use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{interval, timeout};

use crate::agents::ChatClient;
use crate::db::Database;
use crate::models::{JobResult, JobRunStatus, ScheduledJob};

/// Maximum time for one job execution before it is recorded as failed
const JOB_TIMEOUT_SECS: u64 = 60;

/// Stored job output is capped so a runaway agent reply cannot bloat the
/// run history
const OUTPUT_MAX_CHARS: usize = 4000;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Poll interval in seconds for checking due jobs
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            enabled: true,
            poll_interval_secs: 30,
        }
    }
}

/// Parse a cron expression, returning a readable error for the API surface.
pub fn validate_schedule(schedule: &str) -> Result<(), String> {
    cron::Schedule::from_str(schedule)
        .map(|_| ())
        .map_err(|e| format!("Invalid cron expression '{}': {}", schedule, e))
}

/// Next fire time for a cron expression, or None if it never fires again.
pub fn next_run_after_now(schedule: &str) -> Option<DateTime<Utc>> {
    let schedule = cron::Schedule::from_str(schedule).ok()?;
    schedule.upcoming(Utc).next()
}

/// Executes scheduled jobs against department agents through the chat path.
///
/// Every execution gets exactly one JobRun row: inserted as running before
/// the agent call, updated exactly once at completion, timeout included.
pub struct JobRunner {
    db: Arc<Database>,
    chat: ChatClient,
    job_timeout: Duration,
}

impl JobRunner {
    pub fn new(db: Arc<Database>, chat: ChatClient) -> Self {
        JobRunner {
            db,
            chat,
            job_timeout: Duration::from_secs(JOB_TIMEOUT_SECS),
        }
    }

    /// Override the per-job timeout (used by tests).
    pub fn with_timeout(mut self, job_timeout: Duration) -> Self {
        self.job_timeout = job_timeout;
        self
    }

    /// Execute one job to completion and record the run.
    pub async fn execute_job(&self, job: &ScheduledJob) -> JobResult {
        let started = Utc::now();
        log::info!("[SCHEDULER] Executing job '{}' ({})", job.name, job.department);

        // Advance next_run_at BEFORE executing so a long run cannot be
        // picked up again by the next poll tick.
        let next_run = next_run_after_now(&job.schedule).map(|dt| dt.to_rfc3339());
        if let Err(e) = self.db.mark_job_started(&job.name, next_run.as_deref()) {
            log::error!("[SCHEDULER] Failed to mark job '{}' started: {}", job.name, e);
        }

        let run_id = match self.db.insert_job_run(&job.name) {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("[SCHEDULER] Failed to insert run row for '{}': {}", job.name, e);
                None
            }
        };

        let outcome = timeout(self.job_timeout, self.chat.chat(&job.department, &job.task)).await;

        let duration_ms = (Utc::now() - started).num_milliseconds();
        let (success, output, error) = match outcome {
            Ok(Ok(reply)) => {
                let output: String = reply.message.chars().take(OUTPUT_MAX_CHARS).collect();
                (true, output, None)
            }
            Ok(Err(e)) => (false, String::new(), Some(e)),
            Err(_) => (
                false,
                String::new(),
                Some(format!("Job timed out after {}s", self.job_timeout.as_secs())),
            ),
        };

        if let Some(run_id) = run_id {
            let status = if success {
                JobRunStatus::Completed
            } else {
                JobRunStatus::Failed
            };
            if let Err(e) = self.db.complete_job_run(
                &run_id,
                status,
                if success { Some(&output) } else { None },
                error.as_deref(),
            ) {
                log::error!("[SCHEDULER] Failed to complete run row for '{}': {}", job.name, e);
            }
        }

        // Agents sometimes embed a structured summary in their reply; keep
        // it queryable alongside the activity row when they do.
        let metadata = crate::util::extract_json(&output);
        if let Err(e) = self.db.insert_activity(
            Some(&job.name),
            "job.completed",
            &format!(
                "Job '{}' {} in {}ms",
                job.name,
                if success { "completed" } else { "failed" },
                duration_ms
            ),
            Some(&job.agent_name),
            metadata.as_ref(),
        ) {
            log::error!("[AUDIT] Failed to record job activity: {}", e);
        }

        log::info!(
            "[SCHEDULER] Job '{}' finished in {}ms (success: {})",
            job.name,
            duration_ms,
            success
        );

        JobResult {
            job_name: job.name.clone(),
            success,
            output: error.unwrap_or(output),
            duration_ms,
        }
    }

    /// Run one job by name, ahead of its schedule. Unknown and disabled
    /// jobs are reported as errors for the caller to encode; they never
    /// produce a JobRun row.
    pub async fn run_job_by_name(&self, name: &str) -> Result<JobResult, String> {
        let job = self
            .db
            .get_job_by_name(name)
            .map_err(|e| format!("Database error: {}", e))?
            .ok_or_else(|| format!("Job not found: {}", name))?;
        if !job.enabled {
            return Err(format!("Job is disabled: {}", name));
        }
        Ok(self.execute_job(&job).await)
    }

    /// Run every enabled job registered under one cron expression. Jobs run
    /// concurrently and each gets its own result: one job failing never
    /// aborts its siblings.
    pub async fn run_all_jobs_for_schedule(&self, schedule: &str) -> Result<Vec<JobResult>, String> {
        let jobs = self
            .db
            .list_enabled_jobs_for_schedule(schedule)
            .map_err(|e| format!("Database error: {}", e))?;
        log::info!(
            "[SCHEDULER] Batch trigger for '{}' matched {} job(s)",
            schedule,
            jobs.len()
        );
        Ok(join_all(jobs.iter().map(|job| self.execute_job(job))).await)
    }
}

/// The background poll loop that fires due jobs.
pub struct Scheduler {
    db: Arc<Database>,
    runner: Arc<JobRunner>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(db: Arc<Database>, runner: Arc<JobRunner>, config: SchedulerConfig) -> Self {
        Scheduler { db, runner, config }
    }

    /// Start the scheduler background task.
    pub async fn start(self: Arc<Self>, mut shutdown_rx: oneshot::Receiver<()>) {
        if !self.config.enabled {
            log::info!("[SCHEDULER] Disabled by configuration");
            return;
        }

        log::info!(
            "[SCHEDULER] Started (poll: {}s)",
            self.config.poll_interval_secs
        );

        let mut poll_interval = interval(Duration::from_secs(self.config.poll_interval_secs));

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    log::info!("[SCHEDULER] Received shutdown signal");
                    break;
                }
                _ = poll_interval.tick() => {
                    self.tick().await;
                }
            }
        }

        log::info!("[SCHEDULER] Stopped");
    }

    /// One poll tick: fire every due job in its own task.
    async fn tick(&self) {
        let due = match self.db.list_due_jobs(Utc::now()) {
            Ok(jobs) => jobs,
            Err(e) => {
                log::error!("[SCHEDULER] Failed to list due jobs: {}", e);
                return;
            }
        };

        for job in due {
            let runner = Arc::clone(&self.runner);
            tokio::spawn(async move {
                let result = runner.execute_job(&job).await;
                if !result.success {
                    log::error!("[SCHEDULER] Job '{}' failed: {}", result.job_name, result.output);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{ChatReply, MockChatClient};

    fn make_job(db: &Database, name: &str) -> ScheduledJob {
        db.create_job(
            name,
            "0 0 9 * * Mon",
            "operations",
            "Operations AI",
            "Write the weekly status report.",
            true,
            None,
        )
        .unwrap()
    }

    #[test]
    fn schedule_validation_accepts_six_field_cron() {
        assert!(validate_schedule("0 0 9 * * Mon").is_ok());
        assert!(validate_schedule("every monday").is_err());
        assert!(validate_schedule("").is_err());
    }

    #[tokio::test]
    async fn successful_run_is_recorded_once() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let job = make_job(&db, "weekly-report");

        let chat = MockChatClient::new();
        chat.queue_reply("operations", Ok(ChatReply::text("Report written.")));
        let runner = JobRunner::new(db.clone(), ChatClient::Mock(chat));

        let result = runner.execute_job(&job).await;
        assert!(result.success);
        assert_eq!(result.output, "Report written.");

        let runs = db.list_job_runs("weekly-report", 10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, "completed");
        assert_eq!(runs[0].output.as_deref(), Some("Report written."));
        assert!(runs[0].completed_at.is_some());

        // next_run_at was advanced before execution
        let updated = db.get_job_by_name("weekly-report").unwrap().unwrap();
        assert!(updated.next_run_at.is_some());
        assert!(updated.last_run_at.is_some());
    }

    #[tokio::test]
    async fn failed_chat_marks_run_failed() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let job = make_job(&db, "weekly-report");

        let chat = MockChatClient::new();
        chat.queue_reply("operations", Err("agent unavailable".to_string()));
        let runner = JobRunner::new(db.clone(), ChatClient::Mock(chat));

        let result = runner.execute_job(&job).await;
        assert!(!result.success);
        assert_eq!(result.output, "agent unavailable");

        let runs = db.list_job_runs("weekly-report", 10).unwrap();
        assert_eq!(runs[0].status, "failed");
        assert_eq!(runs[0].error.as_deref(), Some("agent unavailable"));
    }

    #[tokio::test]
    async fn slow_job_times_out_and_is_recorded_failed() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let job = make_job(&db, "weekly-report");

        let chat = MockChatClient::new();
        chat.queue_delayed_reply(
            "operations",
            Duration::from_secs(5),
            Ok(ChatReply::text("Too late.")),
        );
        let runner = JobRunner::new(db.clone(), ChatClient::Mock(chat))
            .with_timeout(Duration::from_millis(100));

        let result = runner.execute_job(&job).await;
        assert!(!result.success);
        assert!(result.output.contains("timed out"));

        let runs = db.list_job_runs("weekly-report", 10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, "failed");
    }

    #[tokio::test]
    async fn manual_run_rejects_unknown_and_disabled_jobs() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let job = make_job(&db, "weekly-report");
        db.set_job_enabled(&job.name, false).unwrap();

        let chat = MockChatClient::new();
        let runner = JobRunner::new(db.clone(), ChatClient::Mock(chat.clone()));

        let missing = runner.run_job_by_name("no-such-job").await;
        assert_eq!(missing.unwrap_err(), "Job not found: no-such-job");

        let disabled = runner.run_job_by_name("weekly-report").await;
        assert_eq!(disabled.unwrap_err(), "Job is disabled: weekly-report");

        // Neither attempt reached an agent or left a run row.
        assert!(chat.calls().is_empty());
        assert!(db.list_job_runs("weekly-report", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn poll_picks_up_only_enabled_due_jobs() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        // Never scheduled yet, so due immediately
        make_job(&db, "report-a");
        make_job(&db, "report-b");
        db.set_job_enabled("report-b", false).unwrap();
        // Already scheduled into the future, so not due
        let future = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        db.create_job(
            "daily-sweep",
            "0 0 8 * * *",
            "operations",
            "Operations AI",
            "Sweep.",
            true,
            Some(&future),
        )
        .unwrap();

        let due = db.list_due_jobs(Utc::now()).unwrap();
        let names: Vec<&str> = due.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["report-a"]);
    }

    #[tokio::test]
    async fn schedule_batch_isolates_a_failing_job_from_its_siblings() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        // Two enabled jobs on the same cron, on different departments so the
        // mock can fail one and answer the other.
        db.create_job("ops-report", "0 0 9 * * Mon", "operations", "Operations AI", "Report.", true, None)
            .unwrap();
        db.create_job("sales-digest", "0 0 9 * * Mon", "sales", "Sales AI", "Digest.", true, None)
            .unwrap();
        // Same cron but disabled, must be skipped entirely
        db.create_job("stale-job", "0 0 9 * * Mon", "operations", "Operations AI", "Old.", false, None)
            .unwrap();
        // Different cron, must not match
        db.create_job("daily-sweep", "0 0 8 * * *", "operations", "Operations AI", "Sweep.", true, None)
            .unwrap();

        let chat = MockChatClient::new();
        chat.queue_reply("operations", Err("agent unavailable".to_string()));
        chat.queue_reply("sales", Ok(ChatReply::text("Digest sent.")));
        let runner = JobRunner::new(db.clone(), ChatClient::Mock(chat));

        let results = runner.run_all_jobs_for_schedule("0 0 9 * * Mon").await.unwrap();
        assert_eq!(results.len(), 2);

        let ops = results.iter().find(|r| r.job_name == "ops-report").unwrap();
        assert!(!ops.success);
        assert_eq!(ops.output, "agent unavailable");

        let sales = results.iter().find(|r| r.job_name == "sales-digest").unwrap();
        assert!(sales.success);
        assert_eq!(sales.output, "Digest sent.");

        // Each matched job got its own run row; the disabled one got none.
        assert_eq!(db.list_job_runs("ops-report", 10).unwrap().len(), 1);
        assert_eq!(db.list_job_runs("sales-digest", 10).unwrap().len(), 1);
        assert!(db.list_job_runs("stale-job", 10).unwrap().is_empty());
        assert!(db.list_job_runs("daily-sweep", 10).unwrap().is_empty());
    }

    #[test]
    fn deleted_job_no_longer_resolves() {
        let db = Database::new(":memory:").unwrap();
        make_job(&db, "weekly-report");

        assert!(db.delete_job("weekly-report").unwrap());
        assert!(db.get_job_by_name("weekly-report").unwrap().is_none());
        assert!(!db.delete_job("weekly-report").unwrap());
    }
}
