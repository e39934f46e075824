mod tables;

use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed store shared by every component.
///
/// All access goes through well-defined read/insert/update methods in the
/// `tables/` modules; no caller holds the connection across an await point.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.lock();

        // Shared activity/audit log
        conn.execute(
            "CREATE TABLE IF NOT EXISTS activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_ref TEXT,
                event_type TEXT NOT NULL,
                message TEXT NOT NULL,
                agent_name TEXT,
                metadata TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Completed conversation audit (one row per ConversationLoop run)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                department TEXT NOT NULL,
                user_message TEXT NOT NULL,
                final_text TEXT NOT NULL,
                tool_events TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Per-invocation tool execution audit
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tool_executions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                department TEXT NOT NULL,
                tool_name TEXT NOT NULL,
                parameters TEXT NOT NULL,
                success INTEGER NOT NULL,
                result TEXT,
                duration_ms INTEGER,
                executed_at TEXT NOT NULL
            )",
            [],
        )?;

        // One-shot audit insert per published AgentEvent
        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                payload TEXT NOT NULL,
                from_agent TEXT NOT NULL,
                to_agents TEXT NOT NULL,
                priority TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Scheduled jobs and their run history
        conn.execute(
            "CREATE TABLE IF NOT EXISTS scheduled_jobs (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                schedule TEXT NOT NULL,
                department TEXT NOT NULL,
                agent_name TEXT NOT NULL,
                task TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                next_run_at TEXT,
                last_run_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS job_runs (
                id TEXT PRIMARY KEY,
                job_name TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                status TEXT NOT NULL,
                output TEXT,
                error TEXT
            )",
            [],
        )?;

        // Business data read by the department tools. Written by external
        // collaborators (intake, deploy adapters); this core only reads it,
        // plus insert helpers used by tests.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                platform TEXT NOT NULL,
                status TEXT NOT NULL,
                summary TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS deals (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                stage TEXT NOT NULL,
                value_cents INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS deployments (
                id TEXT PRIMARY KEY,
                ticket_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                status TEXT NOT NULL,
                deployed_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}
