//! Task sink and task query/mutation operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{BusId, Task, TaskId, TaskStatus};

/// Repository trait for generated tasks.
///
/// The generation cycle only calls [`add_tasks`](TaskRepository::add_tasks);
/// drivers and dispatchers use the query and update operations. The two write
/// sets never touch the same fields of an existing task.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Task Sink ====================

    /// Persist a batch of new tasks, assigning each a unique id.
    ///
    /// The batch is stored entirely or not at all.
    ///
    /// # Returns
    /// * `Ok(Vec<Task>)` - the stored tasks with their ids, in input order
    /// * `Err(RepositoryError)` - if nothing was stored
    async fn add_tasks(&self, tasks: &[Task]) -> RepositoryResult<Vec<Task>>;

    // ==================== Queries ====================

    /// All tasks that are not complete.
    async fn list_active_tasks(&self) -> RepositoryResult<Vec<Task>>;

    /// Tasks of one bus that are not complete.
    async fn list_bus_tasks(&self, bus_id: BusId) -> RepositoryResult<Vec<Task>>;

    /// A single task by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - if the task doesn't exist
    async fn get_task(&self, task_id: TaskId) -> RepositoryResult<Task>;

    // ==================== Mutations ====================

    /// Change a task's status. Returns the updated task.
    async fn update_task_status(&self, task_id: TaskId, status: TaskStatus)
        -> RepositoryResult<Task>;

    /// Move a task's start time. Returns the updated task.
    async fn update_task_start(
        &self,
        task_id: TaskId,
        time_start: DateTime<Utc>,
    ) -> RepositoryResult<Task>;

    /// Reassign a task to another bus. Returns the updated task.
    async fn update_task_bus(&self, task_id: TaskId, bus_id: BusId) -> RepositoryResult<Task>;
}
