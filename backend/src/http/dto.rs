//! Data Transfer Objects for the HTTP API.
//!
//! Domain records (`Task`, `CycleRecord`, ...) already derive
//! Serialize/Deserialize and are returned as-is; the types here wrap them in
//! listing envelopes or describe request bodies.

use serde::{Deserialize, Serialize};

pub use crate::models::{Task, TaskStatus};
pub use crate::services::{CycleRecord, CycleStatus, CycleSummary, LogEntry};

/// Request body for changing one parameter of a task.
///
/// ```json
/// { "type": "status", "value": "in work" }
/// { "type": "time", "value": "2024-03-01 09:30:00" }
/// { "type": "busID", "value": "7" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskChangeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

/// Task list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: usize,
}

impl From<Vec<Task>> for TaskListResponse {
    fn from(tasks: Vec<Task>) -> Self {
        Self {
            total: tasks.len(),
            tasks,
        }
    }
}

/// Response for a manually triggered cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerCycleResponse {
    /// Cycle ID for tracking progress
    pub cycle_id: String,
    pub message: String,
}

/// Recent cycles, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleListResponse {
    pub cycles: Vec<CycleRecord>,
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Task store status
    pub repository: String,
}
