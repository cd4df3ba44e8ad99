//! Domain records exchanged between the sources, the generator and the task sink.

pub mod bus;
pub mod flight;
pub mod location;
pub mod macros;
pub mod task;

pub use bus::{Bus, BusId, BusStatus};
pub use flight::{Flight, FlightId, FlightStatus};
pub use location::Location;
pub use task::{Task, TaskId, TaskStatus};

/// Error returned when a status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status '{value}'")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
