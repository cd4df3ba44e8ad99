//! Schedule generation.
//!
//! [`ScheduleGenerator`] assigns available buses to scheduled flights with a
//! greedy nearest-arrival strategy over a [`LocationGraph`](crate::graph::LocationGraph).
//! It performs no I/O: the caller hands in a snapshot of flights and buses and
//! receives the tasks to persist.

pub mod error;
pub mod generator;
pub mod validation;

pub use error::ValidationError;
pub use generator::{
    GeneratedSchedule, GeneratorParams, ScheduleGenerator, UnservedFlight, DEFAULT_BUS_CAPACITY,
    DEFAULT_BUS_SPEED_KMH,
};
pub use validation::validate_input;

#[cfg(test)]
mod tests;
