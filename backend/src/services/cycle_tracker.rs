//! Cycle tracking for periodic and manually triggered schedule generation.
//!
//! Keeps an in-memory, bounded history of generation cycles with their progress
//! logs so that the HTTP surface can list recent cycles and stream the logs of
//! a running one.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use super::scheduler_service::CycleSummary;

/// Finished cycles kept when no limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleTrigger {
    Periodic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    /// Waiting for the running cycle to finish.
    Queued,
    Running,
    Completed,
    Failed,
}

impl CycleStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Cycle metadata and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle_id: String,
    pub trigger: CycleTrigger,
    pub status: CycleStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: Option<CycleSummary>,
    pub error: Option<String>,
}

struct TrackerState {
    cycles: HashMap<String, CycleRecord>,
    /// Cycle ids, oldest first.
    order: VecDeque<String>,
    history_limit: usize,
}

impl TrackerState {
    /// Drop the oldest finished cycles beyond the history limit. Unfinished
    /// cycles are never evicted.
    fn evict(&mut self) {
        while self.order.len() > self.history_limit {
            let Some(pos) = self
                .order
                .iter()
                .position(|id| self.cycles.get(id).is_some_and(|c| c.status.is_finished()))
            else {
                break;
            };
            if let Some(id) = self.order.remove(pos) {
                self.cycles.remove(&id);
            }
        }
    }

    fn insert(&mut self, trigger: CycleTrigger) -> String {
        let cycle_id = Uuid::new_v4().to_string();
        let record = CycleRecord {
            cycle_id: cycle_id.clone(),
            trigger,
            status: CycleStatus::Queued,
            logs: vec![],
            created_at: Utc::now(),
            completed_at: None,
            summary: None,
            error: None,
        };
        self.cycles.insert(cycle_id.clone(), record);
        self.order.push_back(cycle_id.clone());
        self.evict();
        cycle_id
    }

    fn finish(&mut self, cycle_id: &str, update: impl FnOnce(&mut CycleRecord)) {
        if let Some(cycle) = self.cycles.get_mut(cycle_id) {
            update(cycle);
            cycle.completed_at = Some(Utc::now());
        }
        self.evict();
    }
}

/// In-memory cycle tracker.
#[derive(Clone)]
pub struct CycleTracker {
    state: Arc<RwLock<TrackerState>>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a tracker keeping at most `history_limit` finished cycles.
    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(TrackerState {
                cycles: HashMap::new(),
                order: VecDeque::new(),
                history_limit: history_limit.max(1),
            })),
        }
    }

    /// Register a new cycle in the `queued` state and return its ID.
    pub fn start_cycle(&self, trigger: CycleTrigger) -> String {
        self.state.write().insert(trigger)
    }

    /// Return the ID of a cycle with `trigger` that is still queued, or
    /// register a new one. The flag is true when a new cycle was registered.
    pub fn join_or_start(&self, trigger: CycleTrigger) -> (String, bool) {
        let mut state = self.state.write();
        let queued = state
            .order
            .iter()
            .find(|id| {
                state
                    .cycles
                    .get(*id)
                    .is_some_and(|c| c.trigger == trigger && c.status == CycleStatus::Queued)
            })
            .cloned();
        match queued {
            Some(id) => (id, false),
            None => (state.insert(trigger), true),
        }
    }

    pub fn mark_running(&self, cycle_id: &str) {
        if let Some(cycle) = self.state.write().cycles.get_mut(cycle_id) {
            cycle.status = CycleStatus::Running;
        }
    }

    /// Add a log entry to a cycle.
    pub fn log(&self, cycle_id: &str, level: LogLevel, message: impl Into<String>) {
        if let Some(cycle) = self.state.write().cycles.get_mut(cycle_id) {
            cycle.logs.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Mark a cycle as completed with its summary.
    pub fn complete_cycle(&self, cycle_id: &str, summary: CycleSummary) {
        self.state.write().finish(cycle_id, |cycle| {
            cycle.status = CycleStatus::Completed;
            cycle.summary = Some(summary);
        });
    }

    /// Mark a cycle as failed.
    pub fn fail_cycle(&self, cycle_id: &str, error_message: impl Into<String>) {
        let error_message = error_message.into();
        self.state.write().finish(cycle_id, |cycle| {
            cycle.status = CycleStatus::Failed;
            cycle.logs.push(LogEntry {
                timestamp: Utc::now(),
                level: LogLevel::Error,
                message: error_message.clone(),
            });
            cycle.error = Some(error_message);
        });
    }

    /// Get a cycle by ID.
    pub fn get_cycle(&self, cycle_id: &str) -> Option<CycleRecord> {
        self.state.read().cycles.get(cycle_id).cloned()
    }

    /// Get all logs for a cycle.
    pub fn get_logs(&self, cycle_id: &str) -> Vec<LogEntry> {
        self.state
            .read()
            .cycles
            .get(cycle_id)
            .map(|cycle| cycle.logs.clone())
            .unwrap_or_default()
    }

    /// Known cycles, newest first.
    pub fn recent_cycles(&self) -> Vec<CycleRecord> {
        let state = self.state.read();
        state
            .order
            .iter()
            .rev()
            .filter_map(|id| state.cycles.get(id).cloned())
            .collect()
    }
}

impl Default for CycleTracker {
    fn default() -> Self {
        Self::new()
    }
}
