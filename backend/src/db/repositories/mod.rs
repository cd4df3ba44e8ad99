//! Repository implementations module.
//!
//! - `local`: In-memory implementation for local runs and tests
pub mod local;

pub use local::LocalRepository;
