//! Input checks run before every generation cycle.
//!
//! Detects:
//! - duplicate bus or flight ids
//! - negative passenger counts
//! - participating buses or flights whose location is not in the graph
//!
//! Records that do not take part in the cycle (cancelled flights, buses out of
//! service) are only checked for id uniqueness and passenger count sign.

use std::collections::HashSet;

use super::error::ValidationError;
use crate::graph::LocationGraph;
use crate::models::{Bus, Flight};

/// Validates a flight/bus snapshot against the location graph.
///
/// Stops at the first problem found so the error names exactly one record.
pub fn validate_input(
    flights: &[Flight],
    buses: &[Bus],
    graph: &LocationGraph,
) -> Result<(), ValidationError> {
    let mut flight_ids = HashSet::new();
    for flight in flights {
        if !flight_ids.insert(flight.id) {
            return Err(ValidationError::DuplicateFlight(flight.id));
        }
        if flight.passenger_count < 0 {
            return Err(ValidationError::NegativePassengerCount {
                flight_id: flight.id,
                count: flight.passenger_count,
            });
        }
        if flight.needs_transport() && !graph.contains(&flight.destination) {
            return Err(ValidationError::UnknownFlightDestination {
                flight_id: flight.id,
                location: flight.destination.clone(),
            });
        }
    }

    let mut bus_ids = HashSet::new();
    for bus in buses {
        if !bus_ids.insert(bus.id) {
            return Err(ValidationError::DuplicateBus(bus.id));
        }
        if bus.is_available() && !graph.contains(&bus.position) {
            return Err(ValidationError::UnknownBusLocation {
                bus_id: bus.id,
                location: bus.position.clone(),
            });
        }
    }

    Ok(())
}
