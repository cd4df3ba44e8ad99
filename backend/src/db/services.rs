//! High-level task operations.
//!
//! Repository-agnostic functions shared by the HTTP handlers and tests: task
//! listing and the single-parameter task change drivers and dispatchers send.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;
use serde_json::Value;

use super::repository::{RepositoryResult, TaskRepository};
use crate::models::{BusId, Task, TaskId, TaskStatus};

/// Wall-clock format accepted for task start times, interpreted as UTC.
pub const TASK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a change request could not be turned into a [`TaskChange`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskChangeError {
    #[error("wrong parameter '{0}'")]
    UnknownParameter(String),
    #[error("wrong {parameter} value: {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

impl TaskChangeError {
    fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            parameter,
            reason: reason.into(),
        }
    }
}

/// One parameter of a task to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskChange {
    Status(TaskStatus),
    Start(DateTime<Utc>),
    Bus(BusId),
}

impl TaskChange {
    /// Build a change from its wire form.
    ///
    /// `kind` is one of `status`, `time` or `busID`. Values are strings; bus
    /// ids may also be given as JSON numbers.
    pub fn parse(kind: &str, value: &Value) -> Result<Self, TaskChangeError> {
        match kind {
            "status" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| TaskChangeError::invalid("status", "expected a string"))?;
                raw.parse::<TaskStatus>()
                    .map(Self::Status)
                    .map_err(|e| TaskChangeError::invalid("status", e.to_string()))
            }
            "time" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| TaskChangeError::invalid("time", "expected a string"))?;
                parse_task_time(raw).map(Self::Start)
            }
            "busID" => {
                let id = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                id.map(|id| Self::Bus(BusId(id)))
                    .ok_or_else(|| TaskChangeError::invalid("busID", "expected an integer"))
            }
            other => Err(TaskChangeError::UnknownParameter(other.to_string())),
        }
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS` (UTC) or an RFC 3339 timestamp.
pub fn parse_task_time(raw: &str) -> Result<DateTime<Utc>, TaskChangeError> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, TASK_TIME_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TaskChangeError::invalid("time", format!("'{}': {}", raw, e)))
}

// ==================== Health & Connection ====================

/// Check if the task store is healthy.
pub async fn health_check<R: TaskRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Task Operations ====================

/// Non-complete tasks ordered by start time, then id.
pub async fn list_active_tasks<R: TaskRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Task>> {
    let mut tasks = repo.list_active_tasks().await?;
    sort_chronologically(&mut tasks);
    Ok(tasks)
}

/// Non-complete tasks of one bus ordered by start time, then id.
pub async fn list_bus_tasks<R: TaskRepository + ?Sized>(
    repo: &R,
    bus_id: BusId,
) -> RepositoryResult<Vec<Task>> {
    let mut tasks = repo.list_bus_tasks(bus_id).await?;
    sort_chronologically(&mut tasks);
    Ok(tasks)
}

pub async fn get_task<R: TaskRepository + ?Sized>(repo: &R, task_id: TaskId) -> RepositoryResult<Task> {
    repo.get_task(task_id).await
}

/// Apply one change to a task and return the updated task.
pub async fn change_task<R: TaskRepository + ?Sized>(
    repo: &R,
    task_id: TaskId,
    change: TaskChange,
) -> RepositoryResult<Task> {
    let task = match change {
        TaskChange::Status(status) => repo.update_task_status(task_id, status).await?,
        TaskChange::Start(time) => repo.update_task_start(task_id, time).await?,
        TaskChange::Bus(bus_id) => repo.update_task_bus(task_id, bus_id).await?,
    };
    info!("Task {} changed: {:?}", task_id, change);
    Ok(task)
}

fn sort_chronologically(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (t.time_start, t.id));
}
