//! JSON fixtures for the local repository.
//!
//! Flight times are relative (`departs_in_minutes`) so the same fixture keeps
//! producing work no matter when the server starts:
//!
//! ```json
//! {
//!   "buses": [{ "id": 1, "status": "available", "position": "A" }],
//!   "flights": [{ "id": 10, "destination": "C", "departs_in_minutes": 20, "passenger_count": 45 }]
//! }
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::repositories::LocalRepository;
use super::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{Bus, Flight, FlightId, FlightStatus, Location};

/// Flight entry with a departure time relative to load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedFlight {
    pub id: FlightId,
    pub destination: Location,
    pub departs_in_minutes: i64,
    pub passenger_count: i32,
    #[serde(default = "default_flight_status")]
    pub status: FlightStatus,
}

fn default_flight_status() -> FlightStatus {
    FlightStatus::Scheduled
}

impl SeedFlight {
    fn to_flight(&self, now: DateTime<Utc>) -> RepositoryResult<Flight> {
        let scheduled_time = TimeDelta::try_minutes(self.departs_in_minutes)
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| {
                RepositoryError::validation_with_context(
                    format!(
                        "departs_in_minutes {} is out of range",
                        self.departs_in_minutes
                    ),
                    ErrorContext::new("load_seed")
                        .with_entity("flight")
                        .with_entity_id(self.id),
                )
            })?;
        Ok(
            Flight::new(
                self.id,
                self.destination.clone(),
                scheduled_time,
                self.passenger_count,
            )
            .with_status(self.status),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub flights: Vec<SeedFlight>,
}

impl SeedData {
    pub fn from_json(content: &str) -> RepositoryResult<Self> {
        serde_json::from_str(content).map_err(|e| {
            RepositoryError::validation_with_context(
                format!("Failed to parse seed data: {}", e),
                ErrorContext::new("load_seed"),
            )
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read seed file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Load every bus and flight into `repo`, resolving flight times against `now`.
    ///
    /// Nothing is loaded when a flight time cannot be resolved.
    pub fn apply(&self, repo: &LocalRepository, now: DateTime<Utc>) -> RepositoryResult<()> {
        let flights = self
            .flights
            .iter()
            .map(|flight| flight.to_flight(now))
            .collect::<RepositoryResult<Vec<_>>>()?;

        for bus in &self.buses {
            repo.upsert_bus(bus.clone());
        }
        for flight in flights {
            repo.upsert_flight(flight);
        }
        info!(
            "Seeded local repository with {} buses and {} flights",
            self.buses.len(),
            self.flights.len()
        );
        Ok(())
    }
}
