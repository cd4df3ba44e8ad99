//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::TaskRepository;
use crate::services::{CycleTracker, SchedulerService};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Task store for queries and driver updates
    pub tasks: Arc<dyn TaskRepository>,
    /// Scheduler for manual cycles and cycle history
    pub scheduler: Arc<SchedulerService>,
}

impl AppState {
    pub fn new(tasks: Arc<dyn TaskRepository>, scheduler: Arc<SchedulerService>) -> Self {
        Self { tasks, scheduler }
    }

    pub fn tracker(&self) -> &CycleTracker {
        self.scheduler.tracker()
    }
}
