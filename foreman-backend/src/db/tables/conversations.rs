use chrono::Utc;
use rusqlite::Result as SqliteResult;
use serde_json::Value;

use crate::db::Database;

impl Database {
    /// Persist one completed conversation (best-effort audit, never on the hot path).
    pub fn insert_conversation(
        &self,
        department: &str,
        user_message: &str,
        final_text: &str,
        tool_events: &Value,
    ) -> SqliteResult<i64> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO conversations (department, user_message, final_text, tool_events, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![department, user_message, final_text, tool_events.to_string(), &now],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Record one tool invocation (success or failure) for the audit trail.
    pub fn log_tool_execution(
        &self,
        department: &str,
        tool_name: &str,
        parameters: &Value,
        success: bool,
        result: Option<&str>,
        duration_ms: i64,
    ) -> SqliteResult<i64> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO tool_executions (department, tool_name, parameters, success, result, duration_ms, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                department,
                tool_name,
                parameters.to_string(),
                if success { 1 } else { 0 },
                result,
                duration_ms,
                &now
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn count_conversations(&self) -> SqliteResult<i64> {
        let conn = self.lock();
        conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
    }

    pub fn count_tool_executions(&self) -> SqliteResult<i64> {
        let conn = self.lock();
        conn.query_row("SELECT COUNT(*) FROM tool_executions", [], |row| row.get(0))
    }
}
