use async_trait::async_trait;
use chrono::TimeDelta;

use super::error::RepositoryResult;
use crate::models::Flight;

/// Source of flights awaiting ground transport.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Flights whose scheduled time falls within `[now, now + window]`.
    ///
    /// # Returns
    /// * `Ok(Vec<Flight>)` - flights of any status; the generator filters them
    /// * `Err(RepositoryError)` - if the backing store cannot be read
    async fn get_flights(&self, window: TimeDelta) -> RepositoryResult<Vec<Flight>>;
}
