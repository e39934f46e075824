pub mod activity;
pub mod scheduled_job;

pub use activity::ActivityEntry;
pub use scheduled_job::{
    CreateJobRequest, JobResult, JobRun, JobRunStatus, ScheduledJob,
};
