//! # Bus Scheduler
//!
//! Assigns apron buses to departing flights.
//!
//! A [`graph::LocationGraph`] precomputes the shortest distance between every
//! pair of stands and gates. On a fixed interval the
//! [`services::SchedulerService`] fetches the flights departing soon and the
//! current bus pool, lets the [`scheduler::ScheduleGenerator`] assign buses
//! greedily (nearest reachable flight first, without missing departures or
//! exceeding bus capacity) and stores the resulting tasks. Drivers then work
//! through their tasks over the HTTP API.
//!
//! ## Architecture
//!
//! - [`models`]: flights, buses, tasks and their ids
//! - [`graph`]: location graph and all-pairs distances
//! - [`scheduler`]: the pure assignment algorithm and its input validation
//! - [`db`]: repository traits for the flight/bus sources and the task sink,
//!   plus the in-memory store
//! - [`services`]: periodic cycle driver and cycle history
//! - [`config`]: TOML configuration with environment overrides
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod graph;
pub mod models;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
