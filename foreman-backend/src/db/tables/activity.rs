use chrono::Utc;
use rusqlite::Result as SqliteResult;
use serde_json::Value;

use crate::db::Database;
use crate::models::ActivityEntry;

impl Database {
    /// Append one row to the shared activity log.
    pub fn insert_activity(
        &self,
        entity_ref: Option<&str>,
        event_type: &str,
        message: &str,
        agent_name: Option<&str>,
        metadata: Option<&Value>,
    ) -> SqliteResult<i64> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();
        let metadata_str = metadata.map(|m| m.to_string());

        conn.execute(
            "INSERT INTO activity_log (entity_ref, event_type, message, agent_name, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![entity_ref, event_type, message, agent_name, metadata_str, &now],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn list_recent_activity(&self, limit: usize) -> SqliteResult<Vec<ActivityEntry>> {
        let conn = self.lock();

        let mut stmt = conn.prepare(
            "SELECT id, entity_ref, event_type, message, agent_name, metadata, created_at
             FROM activity_log ORDER BY id DESC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map([limit as i64], |row| {
                let metadata_str: Option<String> = row.get(5)?;

                Ok(ActivityEntry {
                    id: row.get(0)?,
                    entity_ref: row.get(1)?,
                    event_type: row.get(2)?,
                    message: row.get(3)?,
                    agent_name: row.get(4)?,
                    metadata: metadata_str.and_then(|s| serde_json::from_str(&s).ok()),
                    created_at: row.get(6)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }
}
