//! Repository factory for dependency injection.
//!
//! Turns the `[repository]` settings into the store the service runs against.

use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositorySettings;
use super::repositories::LocalRepository;
use super::repository::{RepositoryResult, RepositorySet};
use super::seed::SeedData;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

/// A created store, both as its concrete type and as the trait-object bundle
/// the scheduler consumes.
#[derive(Clone)]
pub struct CreatedRepository {
    pub local: Arc<LocalRepository>,
    pub set: RepositorySet,
}

/// Repository factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance from configuration, loading the seed file
    /// when one is configured.
    ///
    /// # Returns
    /// * `Ok(CreatedRepository)` - store ready for use
    /// * `Err(RepositoryError)` - unknown type or unreadable seed
    pub fn create(settings: &RepositorySettings) -> RepositoryResult<CreatedRepository> {
        match settings.repository_type()? {
            RepositoryType::Local => {
                let local = Self::create_local();
                if let Some(path) = &settings.seed_file {
                    SeedData::from_file(path)?.apply(&local, Utc::now())?;
                }
                Ok(CreatedRepository {
                    set: RepositorySet::from_shared(local.clone()),
                    local,
                })
            }
        }
    }

    /// Create an empty in-memory local repository.
    pub fn create_local() -> Arc<LocalRepository> {
        Arc::new(LocalRepository::new())
    }
}
