//! Scheduled job definitions and their run history.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult, Row};
use uuid::Uuid;

use crate::db::Database;
use crate::models::{JobRun, JobRunStatus, ScheduledJob};

fn row_to_job(row: &Row) -> rusqlite::Result<ScheduledJob> {
    Ok(ScheduledJob {
        id: row.get(0)?,
        name: row.get(1)?,
        schedule: row.get(2)?,
        department: row.get(3)?,
        agent_name: row.get(4)?,
        task: row.get(5)?,
        enabled: row.get::<_, i64>(6)? != 0,
        next_run_at: row.get(7)?,
        last_run_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const JOB_COLUMNS: &str =
    "id, name, schedule, department, agent_name, task, enabled, next_run_at, last_run_at, created_at, updated_at";

impl Database {
    pub fn create_job(
        &self,
        name: &str,
        schedule: &str,
        department: &str,
        agent_name: &str,
        task: &str,
        enabled: bool,
        next_run_at: Option<&str>,
    ) -> SqliteResult<ScheduledJob> {
        let conn = self.lock();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO scheduled_jobs
             (id, name, schedule, department, agent_name, task, enabled, next_run_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &id,
                name,
                schedule,
                department,
                agent_name,
                task,
                enabled as i64,
                next_run_at,
                &now,
                &now
            ],
        )?;
        drop(conn);
        self.get_job_by_name(name)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get_job_by_name(&self, name: &str) -> SqliteResult<Option<ScheduledJob>> {
        let conn = self.lock();
        let sql = format!("SELECT {JOB_COLUMNS} FROM scheduled_jobs WHERE name = ?1");
        conn.query_row(&sql, [name], |row| row_to_job(row)).optional()
    }

    pub fn list_jobs(&self) -> SqliteResult<Vec<ScheduledJob>> {
        let conn = self.lock();
        let sql = format!("SELECT {JOB_COLUMNS} FROM scheduled_jobs ORDER BY name");
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map([], |row| row_to_job(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(jobs)
    }

    /// Enabled jobs whose next_run_at has passed (or was never set).
    pub fn list_due_jobs(&self, now: DateTime<Utc>) -> SqliteResult<Vec<ScheduledJob>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs
             WHERE enabled = 1 AND (next_run_at IS NULL OR next_run_at <= ?1)
             ORDER BY name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map([now.to_rfc3339()], |row| row_to_job(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(jobs)
    }

    /// Enabled jobs sharing one cron expression, for batch triggers.
    pub fn list_enabled_jobs_for_schedule(&self, schedule: &str) -> SqliteResult<Vec<ScheduledJob>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs
             WHERE enabled = 1 AND schedule = ?1
             ORDER BY name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map([schedule], |row| row_to_job(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(jobs)
    }

    pub fn set_job_enabled(&self, name: &str, enabled: bool) -> SqliteResult<bool> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();
        let updated = conn.execute(
            "UPDATE scheduled_jobs SET enabled = ?1, updated_at = ?2 WHERE name = ?3",
            rusqlite::params![enabled as i64, &now, name],
        )?;
        Ok(updated > 0)
    }

    /// Advance next_run_at before the job body executes so a crashed run
    /// cannot wedge the job into an immediate-retry loop.
    pub fn mark_job_started(&self, name: &str, next_run_at: Option<&str>) -> SqliteResult<()> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE scheduled_jobs SET last_run_at = ?1, next_run_at = ?2, updated_at = ?1 WHERE name = ?3",
            rusqlite::params![&now, next_run_at, name],
        )?;
        Ok(())
    }

    pub fn delete_job(&self, name: &str) -> SqliteResult<bool> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM scheduled_jobs WHERE name = ?1", [name])?;
        Ok(deleted > 0)
    }

    pub fn insert_job_run(&self, job_name: &str) -> SqliteResult<String> {
        let conn = self.lock();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO job_runs (id, job_name, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![&id, job_name, &now, JobRunStatus::Running.as_str()],
        )?;
        Ok(id)
    }

    pub fn complete_job_run(
        &self,
        run_id: &str,
        status: JobRunStatus,
        output: Option<&str>,
        error: Option<&str>,
    ) -> SqliteResult<()> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE job_runs SET completed_at = ?1, status = ?2, output = ?3, error = ?4 WHERE id = ?5",
            rusqlite::params![&now, status.as_str(), output, error, run_id],
        )?;
        Ok(())
    }

    pub fn list_job_runs(&self, job_name: &str, limit: usize) -> SqliteResult<Vec<JobRun>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, job_name, started_at, completed_at, status, output, error
             FROM job_runs WHERE job_name = ?1 ORDER BY started_at DESC LIMIT ?2",
        )?;
        let runs = stmt
            .query_map(rusqlite::params![job_name, limit as i64], |row| {
                Ok(JobRun {
                    id: row.get(0)?,
                    job_name: row.get(1)?,
                    started_at: row.get(2)?,
                    completed_at: row.get(3)?,
                    status: row.get(4)?,
                    output: row.get(5)?,
                    error: row.get(6)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(runs)
    }
}
