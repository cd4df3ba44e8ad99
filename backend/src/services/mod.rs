//! Service layer for orchestration.
//!
//! Services sit between the repositories and the HTTP surface: the scheduler
//! service runs generation cycles and the cycle tracker records them.

pub mod cycle_tracker;
pub mod scheduler_service;

pub use cycle_tracker::{
    CycleRecord, CycleStatus, CycleTracker, CycleTrigger, LogEntry, LogLevel,
    DEFAULT_HISTORY_LIMIT,
};
pub use scheduler_service::{CycleSummary, SchedulerError, SchedulerService, SchedulerSettings};
