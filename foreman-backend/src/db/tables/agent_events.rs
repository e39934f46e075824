use chrono::Utc;
use rusqlite::Result as SqliteResult;

use crate::db::Database;
use crate::events::AgentEvent;

impl Database {
    /// One-shot audit insert for a published event. The row is never updated.
    pub fn insert_agent_event(&self, event_id: &str, event: &AgentEvent) -> SqliteResult<i64> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO agent_events (event_id, event_type, payload, from_agent, to_agents, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                event_id,
                event.event_type.as_str(),
                event.payload.to_string(),
                &event.from_agent,
                serde_json::to_string(&event.to_agents).unwrap_or_else(|_| "[]".to_string()),
                event.priority.as_str(),
                &now
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn count_agent_events(&self) -> SqliteResult<i64> {
        let conn = self.lock();
        conn.query_row("SELECT COUNT(*) FROM agent_events", [], |row| row.get(0))
    }
}
