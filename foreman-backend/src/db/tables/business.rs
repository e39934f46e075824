//! Business data read by the department tools.
//!
//! These tables are populated by collaborators outside this core (ticket
//! intake, deploy adapters). The insert helpers exist for those callers and
//! for tests; the tools only read.

use chrono::Utc;
use rusqlite::Result as SqliteResult;
use serde_json::{json, Value};

use crate::db::Database;

impl Database {
    pub fn insert_ticket(
        &self,
        id: &str,
        client_name: &str,
        platform: &str,
        status: &str,
        summary: &str,
    ) -> SqliteResult<()> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO tickets (id, client_name, platform, status, summary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![id, client_name, platform, status, summary, &now],
        )?;
        Ok(())
    }

    pub fn get_ticket(&self, id: &str) -> SqliteResult<Option<Value>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, client_name, platform, status, summary, created_at FROM tickets WHERE id = ?1",
        )?;
        let ticket = stmt
            .query_row([id], |row| {
                Ok(json!({
                    "id": row.get::<_, String>(0)?,
                    "client_name": row.get::<_, String>(1)?,
                    "platform": row.get::<_, String>(2)?,
                    "status": row.get::<_, String>(3)?,
                    "summary": row.get::<_, String>(4)?,
                    "created_at": row.get::<_, String>(5)?,
                }))
            })
            .ok();
        Ok(ticket)
    }

    pub fn list_tickets_by_status(&self, status: Option<&str>, limit: usize) -> SqliteResult<Vec<Value>> {
        let conn = self.lock();
        let (sql, params): (&str, Vec<&dyn rusqlite::ToSql>) = match status {
            Some(ref s) => (
                "SELECT id, client_name, platform, status, summary FROM tickets
                 WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2",
                vec![s as &dyn rusqlite::ToSql],
            ),
            None => (
                "SELECT id, client_name, platform, status, summary FROM tickets
                 ORDER BY created_at DESC LIMIT ?1",
                vec![],
            ),
        };

        let limit = limit as i64;
        let mut full_params = params;
        full_params.push(&limit);

        let mut stmt = conn.prepare(sql)?;
        let tickets = stmt
            .query_map(full_params.as_slice(), |row| {
                Ok(json!({
                    "id": row.get::<_, String>(0)?,
                    "client_name": row.get::<_, String>(1)?,
                    "platform": row.get::<_, String>(2)?,
                    "status": row.get::<_, String>(3)?,
                    "summary": row.get::<_, String>(4)?,
                }))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(tickets)
    }

    pub fn insert_deal(
        &self,
        id: &str,
        client_name: &str,
        stage: &str,
        value_cents: i64,
    ) -> SqliteResult<()> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO deals (id, client_name, stage, value_cents, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id, client_name, stage, value_cents, &now],
        )?;
        Ok(())
    }

    /// Deals not yet closed (stage is neither closed_won nor closed_lost).
    pub fn list_open_deals(&self, limit: usize) -> SqliteResult<Vec<Value>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, client_name, stage, value_cents FROM deals
             WHERE stage NOT IN ('closed_won', 'closed_lost')
             ORDER BY created_at DESC LIMIT ?1",
        )?;
        let deals = stmt
            .query_map([limit as i64], |row| {
                Ok(json!({
                    "id": row.get::<_, String>(0)?,
                    "client_name": row.get::<_, String>(1)?,
                    "stage": row.get::<_, String>(2)?,
                    "value_cents": row.get::<_, i64>(3)?,
                }))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(deals)
    }

    pub fn count_open_deals(&self) -> SqliteResult<i64> {
        let conn = self.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM deals WHERE stage NOT IN ('closed_won', 'closed_lost')",
            [],
            |row| row.get(0),
        )
    }

    /// Everything known about one client: their deals and their tickets.
    pub fn lookup_client(&self, client_name: &str) -> SqliteResult<Value> {
        let conn = self.lock();

        let mut stmt = conn.prepare(
            "SELECT id, stage, value_cents FROM deals WHERE client_name = ?1 COLLATE NOCASE",
        )?;
        let deals: Vec<Value> = stmt
            .query_map([client_name], |row| {
                Ok(json!({
                    "id": row.get::<_, String>(0)?,
                    "stage": row.get::<_, String>(1)?,
                    "value_cents": row.get::<_, i64>(2)?,
                }))
            })?
            .filter_map(|r| r.ok())
            .collect();

        let mut stmt = conn.prepare(
            "SELECT id, platform, status, summary FROM tickets WHERE client_name = ?1 COLLATE NOCASE",
        )?;
        let tickets: Vec<Value> = stmt
            .query_map([client_name], |row| {
                Ok(json!({
                    "id": row.get::<_, String>(0)?,
                    "platform": row.get::<_, String>(1)?,
                    "status": row.get::<_, String>(2)?,
                    "summary": row.get::<_, String>(3)?,
                }))
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(json!({
            "client_name": client_name,
            "deals": deals,
            "tickets": tickets,
        }))
    }

    pub fn insert_deployment(
        &self,
        id: &str,
        ticket_id: &str,
        platform: &str,
        status: &str,
    ) -> SqliteResult<()> {
        let conn = self.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO deployments (id, ticket_id, platform, status, deployed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id, ticket_id, platform, status, &now],
        )?;
        Ok(())
    }

    pub fn list_recent_deployments(&self, limit: usize) -> SqliteResult<Vec<Value>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, platform, status, deployed_at FROM deployments
             ORDER BY deployed_at DESC LIMIT ?1",
        )?;
        let deployments = stmt
            .query_map([limit as i64], |row| {
                Ok(json!({
                    "id": row.get::<_, String>(0)?,
                    "ticket_id": row.get::<_, String>(1)?,
                    "platform": row.get::<_, String>(2)?,
                    "status": row.get::<_, String>(3)?,
                    "deployed_at": row.get::<_, String>(4)?,
                }))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(deployments)
    }
}
