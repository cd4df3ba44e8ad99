//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::info;

use super::dto::{
    CycleListResponse, CycleRecord, HealthResponse, TaskChangeRequest, TaskListResponse,
    TriggerCycleResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::db::services::TaskChange;
use crate::models::{BusId, Task, TaskId};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Poll period of the cycle log stream.
const LOG_POLL_INTERVAL: Duration = Duration::from_millis(200);

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and the task store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo_status = match db_services::health_check(state.tasks.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository: repo_status,
    }))
}

// =============================================================================
// Tasks
// =============================================================================

/// GET /v1/tasks
///
/// All tasks that are not complete.
pub async fn list_tasks(State(state): State<AppState>) -> HandlerResult<TaskListResponse> {
    let tasks = db_services::list_active_tasks(state.tasks.as_ref()).await?;
    Ok(Json(tasks.into()))
}

/// GET /v1/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> HandlerResult<Task> {
    let task = db_services::get_task(state.tasks.as_ref(), TaskId::new(task_id)).await?;
    Ok(Json(task))
}

/// GET /v1/buses/{bus_id}/tasks
///
/// The work list of one driver.
pub async fn list_bus_tasks(
    State(state): State<AppState>,
    Path(bus_id): Path<i64>,
) -> HandlerResult<TaskListResponse> {
    let tasks = db_services::list_bus_tasks(state.tasks.as_ref(), BusId::new(bus_id)).await?;
    Ok(Json(tasks.into()))
}

/// POST /v1/tasks/{task_id}
///
/// Change the status, start time or bus of a task.
pub async fn change_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(request): Json<TaskChangeRequest>,
) -> HandlerResult<Task> {
    let change = TaskChange::parse(&request.kind, &request.value)?;
    let task_id = TaskId::new(task_id);
    let task = db_services::change_task(state.tasks.as_ref(), task_id, change).await?;
    info!(task_id = task_id.value(), parameter = %request.kind, "Task changed");
    Ok(Json(task))
}

// =============================================================================
// Generation Cycles
// =============================================================================

/// GET /v1/cycles
pub async fn list_cycles(State(state): State<AppState>) -> HandlerResult<CycleListResponse> {
    let cycles = state.tracker().recent_cycles();
    Ok(Json(CycleListResponse {
        total: cycles.len(),
        cycles,
    }))
}

/// POST /v1/cycles
///
/// Start a generation cycle in the background. Returns a cycle ID for
/// tracking progress.
pub async fn trigger_cycle(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TriggerCycleResponse>), AppError> {
    let cycle_id = state.scheduler.trigger_cycle();
    info!(cycle_id = %cycle_id, "Manual generation cycle queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerCycleResponse {
            message: format!(
                "Generation cycle queued. Track progress at /v1/cycles/{}/logs",
                cycle_id
            ),
            cycle_id,
        }),
    ))
}

/// GET /v1/cycles/{cycle_id}
///
/// Status, logs and summary of one cycle.
pub async fn get_cycle(
    State(state): State<AppState>,
    Path(cycle_id): Path<String>,
) -> HandlerResult<CycleRecord> {
    state
        .tracker()
        .get_cycle(&cycle_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Cycle {} not found", cycle_id)))
}

/// GET /v1/cycles/{cycle_id}/logs
///
/// Stream cycle logs via Server-Sent Events (SSE) until the cycle finishes.
pub async fn stream_cycle_logs(
    State(state): State<AppState>,
    Path(cycle_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.tracker().get_cycle(&cycle_id).is_none() {
        return Err(AppError::NotFound(format!("Cycle {} not found", cycle_id)));
    }

    let tracker = state.tracker().clone();
    let stream = async_stream::stream! {
        let mut sent = 0;
        loop {
            let logs = tracker.get_logs(&cycle_id);
            for entry in logs.iter().skip(sent) {
                let data = serde_json::to_string(entry).unwrap_or_default();
                yield Ok(Event::default().data(data));
            }
            sent = logs.len();

            match tracker.get_cycle(&cycle_id) {
                Some(cycle) if cycle.status.is_finished() => {
                    // Logs written between the two reads above.
                    for entry in cycle.logs.iter().skip(sent) {
                        let data = serde_json::to_string(entry).unwrap_or_default();
                        yield Ok(Event::default().data(data));
                    }
                    let final_event = serde_json::json!({
                        "status": cycle.status,
                        "summary": cycle.summary,
                        "error": cycle.error,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&final_event).unwrap_or_default()));
                    break;
                }
                Some(_) => {}
                None => break,
            }

            tokio::time::sleep(LOG_POLL_INTERVAL).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
