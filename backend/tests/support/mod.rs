#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use bus_scheduler::graph::{Edge, LocationGraph};
use bus_scheduler::models::{Bus, Flight, Location};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Stands `A`, `B`, `C` with `A-B = 2 km` and `B-C = 5 km`, both directions.
pub fn abc_graph() -> Arc<LocationGraph> {
    let edges = [("A", "B", 2.0), ("B", "C", 5.0)]
        .into_iter()
        .flat_map(|(from, to, km)| [Edge::new(from, to, km), Edge::new(to, from, km)]);
    Arc::new(
        LocationGraph::build(["A", "B", "C"].map(Location::new), edges)
            .expect("fixture graph is valid"),
    )
}

/// A scheduled flight departing `minutes` from now.
pub fn flight_in(id: i64, destination: &str, minutes: i64, passengers: i32) -> Flight {
    Flight::new(id, destination, minutes_from_now(minutes), passengers)
}

pub fn bus_at(id: i64, position: &str) -> Bus {
    Bus::new(id, position)
}

pub fn minutes_from_now(minutes: i64) -> DateTime<Utc> {
    Utc::now() + Duration::minutes(minutes)
}
