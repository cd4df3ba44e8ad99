//! Repository trait definitions for the scheduler's collaborators.
//!
//! The generation cycle reads flights and buses and writes tasks; the HTTP
//! surface reads and mutates tasks. Each concern has its own trait so that
//! tests can fake exactly the collaborator they exercise.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`flight`]: flight source
//! - [`bus`]: bus source
//! - [`task`]: task sink plus task query/mutation
//!
//! # Trait Composition
//!
//! A store backing the whole service implements all three traits, which makes
//! it a [`FullRepository`]:
//!
//! ```ignore
//! impl FlightRepository for MyStore { ... }
//! impl BusRepository for MyStore { ... }
//! impl TaskRepository for MyStore { ... }
//! ```

pub mod bus;
pub mod error;
pub mod flight;
pub mod task;

use std::sync::Arc;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use bus::BusRepository;
pub use flight::FlightRepository;
pub use task::TaskRepository;

/// Composite trait bound for a store implementing every repository trait.
pub trait FullRepository: FlightRepository + BusRepository + TaskRepository {}

// Blanket implementation: any type implementing all three traits automatically implements FullRepository
impl<T> FullRepository for T where T: FlightRepository + BusRepository + TaskRepository {}

/// The collaborators a generation cycle depends on, as trait objects.
#[derive(Clone)]
pub struct RepositorySet {
    pub flights: Arc<dyn FlightRepository>,
    pub buses: Arc<dyn BusRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl RepositorySet {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        buses: Arc<dyn BusRepository>,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            flights,
            buses,
            tasks,
        }
    }

    /// Use one store for all three roles.
    pub fn from_shared<R: FullRepository + 'static>(repository: Arc<R>) -> Self {
        Self {
            flights: repository.clone(),
            buses: repository.clone(),
            tasks: repository,
        }
    }
}
