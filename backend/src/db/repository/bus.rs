use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::Bus;

/// Source of buses eligible for assignment.
#[async_trait]
pub trait BusRepository: Send + Sync {
    /// Buses in the working pool (available or currently in work).
    async fn get_buses(&self) -> RepositoryResult<Vec<Bus>>;
}
