use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Location, ParseStatusError};
use crate::define_id_type;

define_id_type!(i64, BusId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "in work")]
    InWork,
    #[serde(rename = "out of service")]
    OutOfService,
}

impl BusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::InWork => "in work",
            Self::OutOfService => "out of service",
        }
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "in work" | "in_work" => Ok(Self::InWork),
            "out of service" | "out_of_service" => Ok(Self::OutOfService),
            other => Err(ParseStatusError::new("bus", other)),
        }
    }
}

/// A bus as reported by the bus source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub status: BusStatus,
    pub position: Location,
    /// Earliest time the bus can start a new task, when later than the cycle start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<DateTime<Utc>>,
}

impl Bus {
    pub fn new(id: impl Into<BusId>, position: impl Into<Location>) -> Self {
        Self {
            id: id.into(),
            status: BusStatus::Available,
            position: position.into(),
            available_from: None,
        }
    }

    pub fn with_status(mut self, status: BusStatus) -> Self {
        self.status = status;
        self
    }

    pub fn available_from(mut self, time: DateTime<Utc>) -> Self {
        self.available_from = Some(time);
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == BusStatus::Available
    }
}
