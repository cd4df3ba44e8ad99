//! In-memory local repository implementation.
//!
//! Implements every repository trait on top of ordered maps guarded by a single
//! lock. Used for local runs (optionally seeded from a JSON fixture) and as the
//! store behind the service and HTTP tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{Bus, BusId, BusStatus, Flight, FlightId, Task, TaskId, TaskStatus};

/// In-memory local repository.
///
/// Cloning is cheap and every clone sees the same data.
///
/// # Example
/// ```
/// use bus_scheduler::db::repositories::LocalRepository;
/// use bus_scheduler::models::Bus;
///
/// let repo = LocalRepository::new();
/// repo.upsert_bus(Bus::new(1, "A"));
/// assert_eq!(repo.bus_count(), 1);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    flights: BTreeMap<FlightId, Flight>,
    buses: BTreeMap<BusId, Bus>,
    tasks: BTreeMap<TaskId, Task>,

    next_task_id: i64,

    // Failure injection
    is_healthy: bool,
    fail_writes: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            flights: BTreeMap::new(),
            buses: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_task_id: 1,
            is_healthy: true,
            fail_writes: false,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Insert or replace a flight.
    pub fn upsert_flight(&self, flight: Flight) {
        self.data.write().flights.insert(flight.id, flight);
    }

    /// Insert or replace a bus.
    pub fn upsert_bus(&self, bus: Bus) {
        self.data.write().buses.insert(bus.id, bus);
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy every trait operation fails with a connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make task writes fail with a transaction error, leaving reads intact.
    pub fn set_fail_writes(&self, fail: bool) {
        self.data.write().fail_writes = fail;
    }

    /// Clear all data, keeping the failure-injection flags.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            fail_writes: data.fail_writes,
            ..Default::default()
        };
    }

    pub fn flight_count(&self) -> usize {
        self.data.read().flights.len()
    }

    pub fn bus_count(&self) -> usize {
        self.data.read().buses.len()
    }

    /// Number of stored tasks, complete ones included.
    pub fn task_count(&self) -> usize {
        self.data.read().tasks.len()
    }

    /// Every stored task in id order, complete ones included.
    pub fn all_tasks(&self) -> Vec<Task> {
        self.data.read().tasks.values().cloned().collect()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Local store is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }

    /// Apply `change` to a task under the write lock and return the result.
    fn modify_task(
        &self,
        operation: &str,
        task_id: TaskId,
        change: impl FnOnce(&mut Task, &LocalData) -> RepositoryResult<()>,
    ) -> RepositoryResult<Task> {
        self.check_health(operation)?;
        let mut data = self.data.write();
        if data.fail_writes {
            return Err(RepositoryError::transaction_with_context(
                "Write rejected",
                ErrorContext::new(operation)
                    .with_entity("task")
                    .with_entity_id(task_id),
            ));
        }

        let mut task = data.tasks.get(&task_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Task {} not found", task_id),
                ErrorContext::new(operation)
                    .with_entity("task")
                    .with_entity_id(task_id),
            )
        })?;
        change(&mut task, &*data).map_err(|e| e.with_operation(operation))?;
        data.tasks.insert(task_id, task.clone());
        Ok(task)
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightRepository for LocalRepository {
    async fn get_flights(&self, window: TimeDelta) -> RepositoryResult<Vec<Flight>> {
        self.check_health("get_flights")?;
        let now = Utc::now();
        let until = now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);

        let data = self.data.read();
        let flights: Vec<Flight> = data
            .flights
            .values()
            .filter(|f| f.scheduled_time >= now && f.scheduled_time <= until)
            .cloned()
            .collect();
        debug!(
            "get_flights: {} of {} flights within {}s",
            flights.len(),
            data.flights.len(),
            window.num_seconds()
        );
        Ok(flights)
    }
}

#[async_trait]
impl BusRepository for LocalRepository {
    async fn get_buses(&self) -> RepositoryResult<Vec<Bus>> {
        self.check_health("get_buses")?;
        Ok(self
            .data
            .read()
            .buses
            .values()
            .filter(|b| b.status != BusStatus::OutOfService)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn add_tasks(&self, tasks: &[Task]) -> RepositoryResult<Vec<Task>> {
        self.check_health("add_tasks")?;
        let mut data = self.data.write();
        if data.fail_writes {
            warn!("add_tasks: rejecting batch of {} tasks", tasks.len());
            return Err(RepositoryError::transaction_with_context(
                "Batch insert rolled back",
                ErrorContext::new("add_tasks")
                    .with_entity("task")
                    .with_details(format!("{} tasks", tasks.len())),
            ));
        }

        // Ids are drawn only after the whole batch is accepted, so a failed
        // batch leaves no trace.
        let mut stored = Vec::with_capacity(tasks.len());
        for task in tasks {
            let id = TaskId(data.next_task_id);
            data.next_task_id += 1;
            let task = Task {
                id: Some(id),
                ..task.clone()
            };
            data.tasks.insert(id, task.clone());
            stored.push(task);
        }
        debug!("add_tasks: stored {} tasks", stored.len());
        Ok(stored)
    }

    async fn list_active_tasks(&self) -> RepositoryResult<Vec<Task>> {
        self.check_health("list_active_tasks")?;
        Ok(self
            .data
            .read()
            .tasks
            .values()
            .filter(|t| !t.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn list_bus_tasks(&self, bus_id: BusId) -> RepositoryResult<Vec<Task>> {
        self.check_health("list_bus_tasks")?;
        Ok(self
            .data
            .read()
            .tasks
            .values()
            .filter(|t| t.bus_id == bus_id && !t.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn get_task(&self, task_id: TaskId) -> RepositoryResult<Task> {
        self.check_health("get_task")?;
        self.data.read().tasks.get(&task_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Task {} not found", task_id),
                ErrorContext::new("get_task")
                    .with_entity("task")
                    .with_entity_id(task_id),
            )
        })
    }

    async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> RepositoryResult<Task> {
        self.modify_task("update_task_status", task_id, |task, _| {
            task.status = status;
            Ok(())
        })
    }

    async fn update_task_start(
        &self,
        task_id: TaskId,
        time_start: DateTime<Utc>,
    ) -> RepositoryResult<Task> {
        self.modify_task("update_task_start", task_id, |task, _| {
            if time_start > task.time_end {
                return Err(RepositoryError::validation_with_context(
                    format!(
                        "Start {} is after the task's end {}",
                        time_start, task.time_end
                    ),
                    ErrorContext::default()
                        .with_entity("task")
                        .with_entity_id(task_id),
                ));
            }
            task.time_start = time_start;
            Ok(())
        })
    }

    async fn update_task_bus(&self, task_id: TaskId, bus_id: BusId) -> RepositoryResult<Task> {
        self.modify_task("update_task_bus", task_id, |task, data| {
            if !data.buses.contains_key(&bus_id) {
                return Err(RepositoryError::not_found_with_context(
                    format!("Bus {} not found", bus_id),
                    ErrorContext::default()
                        .with_entity("bus")
                        .with_entity_id(bus_id),
                ));
            }
            task.bus_id = bus_id;
            Ok(())
        })
    }
}
