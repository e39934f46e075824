//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod activity; // activity_log (shared audit trail)
mod agent_events; // agent_events (one-shot event audit)
mod business; // tickets, deals, deployments (read by department tools)
mod conversations; // conversations, tool_executions
mod jobs; // scheduled_jobs, job_runs
