use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Location, ParseStatusError};
use crate::define_id_type;

define_id_type!(i64, FlightId);

/// Lifecycle state of a flight as reported by the flight source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Boarding,
    Departed,
    Cancelled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Boarding => "boarding",
            Self::Departed => "departed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "boarding" => Ok(Self::Boarding),
            "departed" => Ok(Self::Departed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError::new("flight", other)),
        }
    }
}

/// A flight that needs passengers carried to its stand before `scheduled_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: FlightId,
    pub destination: Location,
    pub scheduled_time: DateTime<Utc>,
    pub status: FlightStatus,
    /// Passengers still needing transport. Signed so that malformed source
    /// rows survive decoding and can be rejected by validation.
    pub passenger_count: i32,
}

impl Flight {
    pub fn new(
        id: impl Into<FlightId>,
        destination: impl Into<Location>,
        scheduled_time: DateTime<Utc>,
        passenger_count: i32,
    ) -> Self {
        Self {
            id: id.into(),
            destination: destination.into(),
            scheduled_time,
            status: FlightStatus::Scheduled,
            passenger_count,
        }
    }

    pub fn with_status(mut self, status: FlightStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the flight takes part in schedule generation.
    pub fn needs_transport(&self) -> bool {
        self.status == FlightStatus::Scheduled && self.passenger_count > 0
    }
}
