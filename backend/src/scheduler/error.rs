use crate::models::{BusId, FlightId, Location};

/// Malformed input handed to the generator. Each variant names the offending record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("flight {flight_id} has negative passenger count {count}")]
    NegativePassengerCount { flight_id: FlightId, count: i32 },

    #[error("bus {bus_id} is parked at unknown location '{location}'")]
    UnknownBusLocation { bus_id: BusId, location: Location },

    #[error("flight {flight_id} is served at unknown location '{location}'")]
    UnknownFlightDestination {
        flight_id: FlightId,
        location: Location,
    },

    #[error("bus {0} appears more than once in the snapshot")]
    DuplicateBus(BusId),

    #[error("flight {0} appears more than once in the snapshot")]
    DuplicateFlight(FlightId),

    #[error("invalid generator parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}
