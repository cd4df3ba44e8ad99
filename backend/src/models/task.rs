use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{BusId, FlightId, ParseStatusError};
use crate::define_id_type;

define_id_type!(i64, TaskId);

/// Progress of a task. Serialized with the same strings drivers send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "queue")]
    Queue,
    #[serde(rename = "in work")]
    InWork,
    #[serde(rename = "on pause")]
    OnPause,
    #[serde(rename = "complete")]
    Complete,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Queue,
        TaskStatus::InWork,
        TaskStatus::OnPause,
        TaskStatus::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::InWork => "in work",
            Self::OnPause => "on pause",
            Self::Complete => "complete",
        }
    }

    /// Completed tasks drop out of the active task listings.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ParseStatusError::new("task", s))
    }
}

/// One bus carrying passengers for one flight within `[time_start, time_end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the task sink; `None` until persisted.
    pub id: Option<TaskId>,
    pub bus_id: BusId,
    pub flight_id: FlightId,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    /// Capacity committed to the flight by this task.
    pub passengers: u32,
    pub status: TaskStatus,
}

impl Task {
    pub fn duration(&self) -> chrono::TimeDelta {
        self.time_end - self.time_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_round_trips_through_strings() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_task_status_rejects_unknown() {
        let err = "done".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.kind, "task");
        assert_eq!(err.value, "done");
    }

    #[test]
    fn test_task_status_serializes_with_spaces() {
        let json = serde_json::to_string(&TaskStatus::OnPause).unwrap();
        assert_eq!(json, "\"on pause\"");
        let status: TaskStatus = serde_json::from_str("\"in work\"").unwrap();
        assert_eq!(status, TaskStatus::InWork);
    }

    #[test]
    fn test_task_ids_serialize_as_scalars() {
        let task = Task {
            id: Some(TaskId::new(3)),
            bus_id: BusId::new(1),
            flight_id: FlightId::new(2),
            time_start: DateTime::UNIX_EPOCH,
            time_end: DateTime::UNIX_EPOCH,
            passengers: 30,
            status: TaskStatus::Queue,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["bus_id"], 1);
        assert_eq!(value["status"], "queue");
    }
}
