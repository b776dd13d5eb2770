//! Background maintenance jobs.

mod gauges;
mod scheduler;
mod session_cleanup;

pub use gauges::GaugeSnapshotJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use session_cleanup::SessionCleanupJob;
