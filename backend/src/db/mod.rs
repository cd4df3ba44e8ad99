//! Storage for flights, buses and generated tasks.
//!
//! Collaborators are reached through the Repository pattern so that the
//! scheduler and the HTTP layer never depend on a concrete store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Scheduler service, HTTP handlers                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                             │
//! │  - task listing order                                    │
//! │  - single-parameter task changes                         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/)                         │
//! │  - FlightRepository (flight source)                      │
//! │  - BusRepository (bus source)                            │
//! │  - TaskRepository (task sink, queries, mutations)        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │     (in-memory, optionally JSON-seeded)       │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use bus_scheduler::db::{RepositoryFactory, RepositorySettings};
//!
//! let created = RepositoryFactory::create(&RepositorySettings::default())?;
//! let tasks = bus_scheduler::db::services::list_active_tasks(created.set.tasks.as_ref()).await?;
//! ```

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod seed;
pub mod services;


// ==================== Service Layer ====================

pub use services::{
    change_task, get_task, health_check, list_active_tasks, list_bus_tasks, parse_task_time,
    TaskChange, TaskChangeError,
};

// ==================== Repository Pattern Exports ====================

pub use factory::{CreatedRepository, RepositoryFactory, RepositoryType};
pub use repo_config::RepositorySettings;
pub use repositories::LocalRepository;
pub use repository::{
    BusRepository, ErrorContext, FlightRepository, FullRepository, RepositoryError,
    RepositoryResult, RepositorySet, TaskRepository,
};
pub use seed::{SeedData, SeedFlight};
