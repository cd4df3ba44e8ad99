use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::error::ValidationError;
use super::validation::validate_input;
use crate::graph::LocationGraph;
use crate::models::{Bus, Flight, FlightId, Location, Task, TaskStatus};

/// Passengers one bus carries per task.
pub const DEFAULT_BUS_CAPACITY: u32 = 30;
/// Average apron speed used to turn graph distances (km) into travel time.
pub const DEFAULT_BUS_SPEED_KMH: f64 = 45.0;

/// Fixed policy values of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub bus_capacity: u32,
    pub bus_speed_kmh: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_BUS_CAPACITY,
            bus_speed_kmh: DEFAULT_BUS_SPEED_KMH,
        }
    }
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bus_capacity == 0 {
            return Err(ValidationError::InvalidParameter {
                name: "bus_capacity",
                value: self.bus_capacity.to_string(),
            });
        }
        if !(self.bus_speed_kmh.is_finite() && self.bus_speed_kmh > 0.0) {
            return Err(ValidationError::InvalidParameter {
                name: "bus_speed_kmh",
                value: self.bus_speed_kmh.to_string(),
            });
        }
        Ok(())
    }

    /// Time needed to cover `distance` km, rounded to the millisecond.
    /// `None` for unreachable (infinite) distances.
    pub fn travel_time(&self, distance: f64) -> Option<TimeDelta> {
        if !distance.is_finite() {
            return None;
        }
        let millis = (distance / self.bus_speed_kmh * 3_600_000.0).round();
        if !millis.is_finite() || millis >= i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_milliseconds(millis as i64)
    }
}

/// A flight that still had demand left when the cycle finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnservedFlight {
    pub flight_id: FlightId,
    pub requested: u32,
    pub remaining: u32,
}

/// Result of one generation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSchedule {
    /// Tasks ordered by bus id, then chronologically per bus.
    pub tasks: Vec<Task>,
    /// Participating flights left with remaining demand, by flight id.
    pub unserved: Vec<UnservedFlight>,
}

impl GeneratedSchedule {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn passengers_assigned(&self) -> u64 {
        self.tasks.iter().map(|t| u64::from(t.passengers)).sum()
    }
}

/// Working copy of a flight's demand within one cycle.
struct Candidate<'a> {
    flight: &'a Flight,
    remaining: u32,
}

/// Working copy of a bus's position and next free time within one cycle.
struct BusCursor<'a> {
    location: &'a Location,
    free_at: DateTime<Utc>,
    served: HashSet<FlightId>,
}

/// Greedy bus-to-flight assignment.
///
/// For every available bus (ascending id) the generator repeatedly picks the
/// flight it can reach earliest without missing the flight's scheduled time,
/// ties broken by the smallest flight id. Each pick becomes a task carrying up
/// to `bus_capacity` passengers; the bus then waits at that stand for its next
/// pick. A bus serves a given flight at most once per cycle, so flights with
/// more passengers than one bus holds are split across buses. When fewer
/// buses can reach a flight than `ceil(passengers / bus_capacity)`, the
/// leftover demand is reported in [`GeneratedSchedule::unserved`] for the
/// next cycle, even if one bus would have time for a second trip.
///
/// The output only depends on the inputs: buses and flights are sorted by id
/// before assignment.
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    graph: Arc<LocationGraph>,
    params: GeneratorParams,
}

impl ScheduleGenerator {
    pub fn new(graph: Arc<LocationGraph>, params: GeneratorParams) -> Self {
        Self { graph, params }
    }

    pub fn graph(&self) -> &LocationGraph {
        &self.graph
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Travel time between two locations, `None` when there is no route.
    pub fn travel_time(&self, from: &Location, to: &Location) -> Option<TimeDelta> {
        let distance = self.graph.distance(from, to).ok()?;
        self.params.travel_time(distance)
    }

    /// Run one generation cycle.
    ///
    /// # Arguments
    /// * `flights` - flight snapshot; only `scheduled` flights with passengers take part
    /// * `buses` - bus snapshot; only `available` buses take part
    /// * `cycle_start` - earliest start time of any task
    /// * `horizon_end` - a bus stops receiving tasks once it is free after this time
    ///
    /// # Errors
    /// [`ValidationError`] for malformed input (see [`validate_input`]) or
    /// invalid parameters. Unreachable flights are not errors.
    pub fn generate(
        &self,
        flights: &[Flight],
        buses: &[Bus],
        cycle_start: DateTime<Utc>,
        horizon_end: Option<DateTime<Utc>>,
    ) -> Result<GeneratedSchedule, ValidationError> {
        self.params.validate()?;
        validate_input(flights, buses, &self.graph)?;

        let mut candidates: Vec<Candidate<'_>> = flights
            .iter()
            .filter(|flight| flight.needs_transport())
            .map(|flight| Candidate {
                flight,
                remaining: flight.passenger_count.unsigned_abs(),
            })
            .collect();
        candidates.sort_by_key(|c| c.flight.id);

        let mut fleet: Vec<&Bus> = buses.iter().filter(|bus| bus.is_available()).collect();
        fleet.sort_by_key(|bus| bus.id);

        debug!(
            "Generating schedule for {} flights and {} buses from {}",
            candidates.len(),
            fleet.len(),
            cycle_start
        );

        let mut tasks = Vec::new();
        for bus in fleet {
            let mut cursor = BusCursor {
                location: &bus.position,
                free_at: bus
                    .available_from
                    .map_or(cycle_start, |from| from.max(cycle_start)),
                served: HashSet::new(),
            };

            loop {
                if horizon_end.is_some_and(|end| cursor.free_at > end) {
                    trace!("Bus {} is past the horizon", bus.id);
                    break;
                }
                let Some((idx, arrival)) = self.nearest_flight(&cursor, &candidates) else {
                    break;
                };

                let candidate = &mut candidates[idx];
                let passengers = self.params.bus_capacity.min(candidate.remaining);
                candidate.remaining -= passengers;
                let flight = candidate.flight;

                tasks.push(Task {
                    id: None,
                    bus_id: bus.id,
                    flight_id: flight.id,
                    time_start: cursor.free_at,
                    time_end: arrival,
                    passengers,
                    status: TaskStatus::Queue,
                });
                trace!(
                    "Bus {} -> flight {} ({} passengers, arrives {})",
                    bus.id,
                    flight.id,
                    passengers,
                    arrival
                );

                cursor.location = &flight.destination;
                cursor.free_at = arrival;
                cursor.served.insert(flight.id);

                if candidates[idx].remaining == 0 {
                    // `remove` keeps the id order the tie-break relies on.
                    candidates.remove(idx);
                }
            }
        }

        let unserved = candidates
            .iter()
            .map(|c| UnservedFlight {
                flight_id: c.flight.id,
                requested: c.flight.passenger_count.unsigned_abs(),
                remaining: c.remaining,
            })
            .collect::<Vec<_>>();

        debug!(
            "Generated {} tasks, {} flights left with demand",
            tasks.len(),
            unserved.len()
        );

        Ok(GeneratedSchedule { tasks, unserved })
    }

    /// Index and arrival time of the flight the bus reaches first in time.
    fn nearest_flight(
        &self,
        cursor: &BusCursor<'_>,
        candidates: &[Candidate<'_>],
    ) -> Option<(usize, DateTime<Utc>)> {
        let mut best: Option<(usize, DateTime<Utc>)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let flight = candidate.flight;
            if cursor.served.contains(&flight.id) {
                continue;
            }
            let Some(travel) = self.travel_time(cursor.location, &flight.destination) else {
                continue;
            };
            let Some(arrival) = cursor.free_at.checked_add_signed(travel) else {
                continue;
            };
            if arrival > flight.scheduled_time {
                continue;
            }
            // Candidates are sorted by id, so a strict comparison keeps the
            // smallest id among equal arrivals.
            if best.map_or(true, |(_, best_arrival)| arrival < best_arrival) {
                best = Some((idx, arrival));
            }
        }
        best
    }
}
