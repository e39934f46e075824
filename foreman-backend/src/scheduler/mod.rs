pub mod runner;

pub use runner::{next_run_after_now, validate_schedule, JobRunner, Scheduler, SchedulerConfig};
