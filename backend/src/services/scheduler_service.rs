//! Periodic schedule generation.
//!
//! A cycle fetches the flights departing within the lookahead window and the
//! current bus pool, runs the [`ScheduleGenerator`] and hands the resulting
//! tasks to the task sink. [`SchedulerService::run`] repeats this on a fixed
//! interval until shutdown is signalled.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::cycle_tracker::{CycleTracker, CycleTrigger, LogLevel};
use crate::db::repository::{RepositoryError, RepositoryResult, RepositorySet};
use crate::graph::LocationGraph;
use crate::models::TaskId;
use crate::scheduler::{GeneratorParams, ScheduleGenerator, UnservedFlight, ValidationError};

/// Why a cycle produced no tasks.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The flight or bus source failed.
    #[error("{operation} failed: {source}")]
    Retrieval {
        operation: &'static str,
        source: RepositoryError,
    },

    /// The task sink rejected the batch; nothing was stored.
    #[error("storing tasks failed: {source}")]
    Persistence { source: RepositoryError },

    #[error("invalid cycle input: {0}")]
    Validation(#[from] ValidationError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl SchedulerError {
    /// Whether the next cycle may succeed without anyone fixing the data.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Retrieval { source, .. } | Self::Persistence { source } => source.is_retryable(),
            Self::Timeout { .. } => true,
            Self::Validation(_) => false,
        }
    }
}

/// Runtime settings of the service.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    /// Time between the starts of two periodic cycles.
    pub interval: Duration,
    /// Flights departing within `[now, now + lookahead]` are considered.
    pub lookahead: TimeDelta,
    /// Bound on every source/sink call.
    pub io_timeout: Duration,
    pub generator: GeneratorParams,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            lookahead: TimeDelta::minutes(30),
            io_timeout: Duration::from_secs(30),
            generator: GeneratorParams::default(),
        }
    }
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle_start: Option<DateTime<Utc>>,
    pub flights_fetched: usize,
    pub buses_fetched: usize,
    pub tasks_created: usize,
    pub passengers_assigned: u64,
    pub task_ids: Vec<TaskId>,
    pub unserved: Vec<UnservedFlight>,
}

/// Drives generation cycles against the configured collaborators.
pub struct SchedulerService {
    sources: RepositorySet,
    generator: ScheduleGenerator,
    settings: SchedulerSettings,
    tracker: CycleTracker,
    /// Serializes periodic and manual cycles.
    cycle_lock: Mutex<()>,
}

impl SchedulerService {
    pub fn new(
        sources: RepositorySet,
        graph: Arc<LocationGraph>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            generator: ScheduleGenerator::new(graph, settings.generator),
            sources,
            settings,
            tracker: CycleTracker::new(),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Record cycles in `tracker` instead of a private one.
    pub fn with_tracker(mut self, tracker: CycleTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn tracker(&self) -> &CycleTracker {
        &self.tracker
    }

    pub fn generator(&self) -> &ScheduleGenerator {
        &self.generator
    }

    /// Run one cycle now, waiting for a running cycle to finish first.
    pub async fn run_cycle(&self) -> Result<CycleSummary, SchedulerError> {
        let cycle_id = self.tracker.start_cycle(CycleTrigger::Manual);
        self.run_tracked(&cycle_id).await
    }

    /// Queue a cycle in the background and return its id immediately.
    ///
    /// While a manual cycle is still waiting for the running one, further
    /// triggers return that queued cycle's id instead of queueing another.
    pub fn trigger_cycle(self: &Arc<Self>) -> String {
        let (cycle_id, created) = self.tracker.join_or_start(CycleTrigger::Manual);
        if !created {
            debug!(cycle_id = %cycle_id, "Manual cycle already queued");
            return cycle_id;
        }
        let service = Arc::clone(self);
        let id = cycle_id.clone();
        tokio::spawn(async move {
            // Outcome is recorded by the tracker.
            let _ = service.run_tracked(&id).await;
        });
        cycle_id
    }

    /// Run cycles every `interval` until `shutdown` turns true or its sender
    /// is dropped. The first cycle starts immediately. A cycle in progress is
    /// finished before the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.settings.interval.as_secs(),
            "Scheduler loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    let cycle_id = self.tracker.start_cycle(CycleTrigger::Periodic);
                    // Outcome is logged inside run_tracked.
                    let _ = self.run_tracked(&cycle_id).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler loop stopped");
    }

    async fn run_tracked(&self, cycle_id: &str) -> Result<CycleSummary, SchedulerError> {
        let _guard = self.cycle_lock.lock().await;
        self.tracker.mark_running(cycle_id);

        let result = self.execute(cycle_id).await;
        match &result {
            Ok(summary) => {
                info!(
                    cycle_id,
                    tasks = summary.tasks_created,
                    passengers = summary.passengers_assigned,
                    unserved = summary.unserved.len(),
                    "Generation cycle completed"
                );
                self.tracker.complete_cycle(cycle_id, summary.clone());
            }
            Err(e) if e.is_retryable() => {
                warn!(cycle_id, error = %e, "Generation cycle failed, retrying next tick");
                self.tracker.fail_cycle(cycle_id, e.to_string());
            }
            Err(e) => {
                error!(cycle_id, error = %e, "Generation cycle failed");
                self.tracker.fail_cycle(cycle_id, e.to_string());
            }
        }
        result
    }

    async fn execute(&self, cycle_id: &str) -> Result<CycleSummary, SchedulerError> {
        let cycle_start = Utc::now();
        let horizon_end = cycle_start.checked_add_signed(self.settings.lookahead);

        let flights = self
            .bounded(
                "get_flights",
                self.sources.flights.get_flights(self.settings.lookahead),
                |source| SchedulerError::Retrieval {
                    operation: "get_flights",
                    source,
                },
            )
            .await?;
        let buses = self
            .bounded("get_buses", self.sources.buses.get_buses(), |source| {
                SchedulerError::Retrieval {
                    operation: "get_buses",
                    source,
                }
            })
            .await?;
        self.tracker.log(
            cycle_id,
            LogLevel::Info,
            format!("Fetched {} flights and {} buses", flights.len(), buses.len()),
        );

        let schedule = self
            .generator
            .generate(&flights, &buses, cycle_start, horizon_end)?;
        debug!(
            cycle_id,
            tasks = schedule.tasks.len(),
            "Schedule generated"
        );
        for unserved in &schedule.unserved {
            self.tracker.log(
                cycle_id,
                LogLevel::Warning,
                format!(
                    "Flight {}: {} of {} passengers without a bus",
                    unserved.flight_id, unserved.remaining, unserved.requested
                ),
            );
        }

        let stored = if schedule.is_empty() {
            Vec::new()
        } else {
            self.bounded(
                "add_tasks",
                self.sources.tasks.add_tasks(&schedule.tasks),
                |source| SchedulerError::Persistence { source },
            )
            .await?
        };
        self.tracker.log(
            cycle_id,
            LogLevel::Success,
            format!("Stored {} tasks", stored.len()),
        );

        Ok(CycleSummary {
            cycle_start: Some(cycle_start),
            flights_fetched: flights.len(),
            buses_fetched: buses.len(),
            tasks_created: stored.len(),
            passengers_assigned: schedule.passengers_assigned(),
            task_ids: stored.iter().filter_map(|t| t.id).collect(),
            unserved: schedule.unserved,
        })
    }

    /// Await a collaborator call for at most `io_timeout`.
    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        call: F,
        wrap: impl FnOnce(RepositoryError) -> SchedulerError,
    ) -> Result<T, SchedulerError>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        match tokio::time::timeout(self.settings.io_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(wrap(e.with_operation(operation))),
            Err(_) => Err(SchedulerError::Timeout {
                operation,
                after: self.settings.io_timeout,
            }),
        }
    }
}
