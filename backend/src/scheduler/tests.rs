//! Tests for the greedy schedule generator.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use crate::graph::{Edge, LocationGraph};
use crate::models::{Bus, BusId, BusStatus, Flight, FlightId, FlightStatus, Location, Task, TaskStatus};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

fn minutes(m: i64) -> TimeDelta {
    TimeDelta::minutes(m)
}

/// A <-> B = 2 km, B <-> C = 5 km, no direct A-C road.
fn apron() -> Arc<LocationGraph> {
    Arc::new(
        LocationGraph::build(
            ["A", "B", "C"].map(Location::from),
            vec![
                Edge::new("A", "B", 2.0),
                Edge::new("B", "A", 2.0),
                Edge::new("B", "C", 5.0),
                Edge::new("C", "B", 5.0),
            ],
        )
        .unwrap(),
    )
}

/// 60 km/h makes one graph unit one minute.
fn generator_with(capacity: u32) -> ScheduleGenerator {
    ScheduleGenerator::new(
        apron(),
        GeneratorParams {
            bus_capacity: capacity,
            bus_speed_kmh: 60.0,
        },
    )
}

fn generator() -> ScheduleGenerator {
    generator_with(30)
}

fn flight(id: i64, destination: &str, deadline_minutes: i64, passengers: i32) -> Flight {
    Flight::new(id, destination, t0() + minutes(deadline_minutes), passengers)
}

fn bus(id: i64, position: &str) -> Bus {
    Bus::new(id, position)
}

fn assert_invariants(generator: &ScheduleGenerator, flights: &[Flight], buses: &[Bus], tasks: &[Task]) {
    let by_id: HashMap<FlightId, &Flight> = flights.iter().map(|f| (f.id, f)).collect();

    // Capacity per flight.
    let mut committed: HashMap<FlightId, u64> = HashMap::new();
    for task in tasks {
        *committed.entry(task.flight_id).or_default() += u64::from(task.passengers);
    }
    for (flight_id, total) in committed {
        let flight = by_id[&flight_id];
        assert!(total <= flight.passenger_count as u64, "flight {} over-committed", flight_id);
    }

    // Per-bus ordering, non-overlap and reachability.
    let mut per_bus: HashMap<BusId, Vec<&Task>> = HashMap::new();
    for task in tasks {
        per_bus.entry(task.bus_id).or_default().push(task);
    }
    for (bus_id, bus_tasks) in per_bus {
        let bus = buses.iter().find(|b| b.id == bus_id).unwrap();
        let mut location = bus.position.clone();
        let mut previous_end: Option<DateTime<Utc>> = None;
        for task in bus_tasks {
            let flight = by_id[&task.flight_id];
            assert!(task.time_start <= task.time_end);
            if let Some(end) = previous_end {
                assert!(task.time_start >= end, "bus {} tasks overlap", bus_id);
            }
            let travel = generator.travel_time(&location, &flight.destination).unwrap();
            assert_eq!(task.time_start + travel, task.time_end);
            assert!(task.time_end <= flight.scheduled_time, "deadline missed");
            assert!(task.passengers > 0);
            assert_eq!(task.status, TaskStatus::Queue);
            assert!(task.id.is_none());
            location = flight.destination.clone();
            previous_end = Some(task.time_end);
        }
    }
}

#[test]
fn test_single_bus_single_flight() {
    let generator = generator();
    let flights = vec![flight(1, "B", 10, 10)];
    let buses = vec![bus(1, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 1);
    let task = &schedule.tasks[0];
    assert_eq!(task.bus_id, BusId::new(1));
    assert_eq!(task.flight_id, FlightId::new(1));
    assert_eq!(task.time_start, t0());
    assert_eq!(task.time_end, t0() + minutes(2));
    assert_eq!(task.passengers, 10);
    assert!(schedule.unserved.is_empty());
}

#[test]
fn test_travel_time_scales_with_bus_speed() {
    let generator = ScheduleGenerator::new(
        apron(),
        GeneratorParams {
            bus_capacity: 30,
            bus_speed_kmh: 45.0,
        },
    );
    let schedule = generator
        .generate(&[flight(1, "B", 10, 10)], &[bus(1, "A")], t0(), None)
        .unwrap();
    // 2 km at 45 km/h = 160 s
    assert_eq!(schedule.tasks[0].time_end, t0() + TimeDelta::seconds(160));
}

#[test]
fn test_large_flight_split_across_two_buses() {
    let generator = generator();
    let flights = vec![flight(7, "B", 30, 50)];
    let buses = vec![bus(1, "A"), bus(2, "C")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 2);
    assert_eq!(schedule.tasks[0].bus_id, BusId::new(1));
    assert_eq!(schedule.tasks[0].passengers, 30);
    assert_eq!(schedule.tasks[1].bus_id, BusId::new(2));
    assert_eq!(schedule.tasks[1].passengers, 20);
    assert_eq!(schedule.tasks[1].time_end, t0() + minutes(5));
    assert!(schedule.unserved.is_empty());
    assert_invariants(&generator, &flights, &buses, &schedule.tasks);
}

#[test]
fn test_unreachable_deadline_produces_no_task() {
    let generator = generator();
    let flights = vec![flight(1, "C", 3, 20)];
    let buses = vec![bus(1, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert!(schedule.tasks.is_empty());
    assert_eq!(
        schedule.unserved,
        vec![UnservedFlight {
            flight_id: FlightId::new(1),
            requested: 20,
            remaining: 20,
        }]
    );
    // The snapshot is untouched, so the next cycle sees the same flight.
    assert_eq!(flights[0].passenger_count, 20);
    let again = generator.generate(&flights, &buses, t0(), None).unwrap();
    assert_eq!(again, schedule);
}

#[test]
fn test_bus_takes_sequential_tasks() {
    let generator = generator();
    let flights = vec![flight(1, "B", 5, 10), flight(2, "C", 20, 10)];
    let buses = vec![bus(1, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 2);
    assert_eq!(schedule.tasks[0].flight_id, FlightId::new(1));
    assert_eq!(schedule.tasks[0].time_end, t0() + minutes(2));
    assert_eq!(schedule.tasks[1].flight_id, FlightId::new(2));
    assert_eq!(schedule.tasks[1].time_start, t0() + minutes(2));
    assert_eq!(schedule.tasks[1].time_end, t0() + minutes(7));
    assert_invariants(&generator, &flights, &buses, &schedule.tasks);
}

#[test]
fn test_nearest_arrival_is_chosen_first() {
    let generator = generator();
    // Flight 1 is far (C), flight 2 is close (B): the bus goes to B first.
    let flights = vec![flight(1, "C", 60, 5), flight(2, "B", 60, 5)];
    let buses = vec![bus(1, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    let order: Vec<i64> = schedule.tasks.iter().map(|t| t.flight_id.value()).collect();
    assert_eq!(order, vec![2, 1]);
}

#[test]
fn test_ties_broken_by_smallest_flight_id() {
    let generator = generator();
    let flights = vec![flight(9, "B", 60, 5), flight(4, "B", 60, 5)];
    let buses = vec![bus(1, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks[0].flight_id, FlightId::new(4));
    assert_eq!(schedule.tasks[1].flight_id, FlightId::new(9));
    // Same stand: the second task has zero travel time.
    assert_eq!(schedule.tasks[1].time_start, schedule.tasks[1].time_end);
}

#[test]
fn test_buses_processed_in_id_order() {
    let generator = generator();
    let flights = vec![flight(1, "B", 60, 30)];
    let buses = vec![bus(5, "B"), bus(2, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    // Bus 2 comes first even though bus 5 is closer.
    assert_eq!(schedule.tasks.len(), 1);
    assert_eq!(schedule.tasks[0].bus_id, BusId::new(2));
}

#[test]
fn test_fully_served_flight_receives_no_more_buses() {
    let generator = generator();
    let flights = vec![flight(1, "B", 60, 30)];
    let buses = vec![bus(1, "A"), bus(2, "A"), bus(3, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 1);
    assert_eq!(schedule.passengers_assigned(), 30);
}

#[test]
fn test_bus_does_not_serve_same_flight_twice() {
    let generator = generator_with(10);
    let flights = vec![flight(1, "B", 60, 35)];
    let buses = vec![bus(1, "A")];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 1);
    assert_eq!(schedule.unserved[0].remaining, 25);
}

#[test]
fn test_small_fleet_leaves_demand_for_next_cycle() {
    let flights = vec![flight(1, "B", 30, 60)];
    let buses = vec![bus(1, "B")];

    let schedule = generator().generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 1);
    assert_eq!(schedule.tasks[0].passengers, 30);
    assert_eq!(schedule.unserved.len(), 1);
    assert_eq!(schedule.unserved[0].requested, 60);
    assert_eq!(schedule.unserved[0].remaining, 30);
}

#[test]
fn test_only_scheduled_flights_and_available_buses_participate() {
    let generator = generator();
    let flights = vec![
        flight(1, "B", 60, 10).with_status(FlightStatus::Cancelled),
        flight(2, "B", 60, 10).with_status(FlightStatus::Departed),
        flight(3, "B", 60, 0),
        flight(4, "B", 60, 10),
    ];
    let buses = vec![
        bus(1, "A").with_status(BusStatus::OutOfService),
        bus(2, "A").with_status(BusStatus::InWork),
        bus(3, "A"),
    ];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 1);
    assert_eq!(schedule.tasks[0].bus_id, BusId::new(3));
    assert_eq!(schedule.tasks[0].flight_id, FlightId::new(4));
}

#[test]
fn test_bus_available_later_starts_later() {
    let generator = generator();
    let flights = vec![flight(1, "B", 10, 10)];
    let buses = vec![bus(1, "A").available_from(t0() + minutes(5))];

    let schedule = generator.generate(&flights, &buses, t0(), None).unwrap();

    assert_eq!(schedule.tasks[0].time_start, t0() + minutes(5));
    assert_eq!(schedule.tasks[0].time_end, t0() + minutes(7));

    let late = vec![bus(1, "A").available_from(t0() + minutes(9))];
    let schedule = generator.generate(&flights, &late, t0(), None).unwrap();
    assert!(schedule.tasks.is_empty());
}

#[test]
fn test_available_from_in_the_past_uses_cycle_start() {
    let generator = generator();
    let buses = vec![bus(1, "A").available_from(t0() - minutes(30))];
    let schedule = generator
        .generate(&[flight(1, "B", 10, 10)], &buses, t0(), None)
        .unwrap();
    assert_eq!(schedule.tasks[0].time_start, t0());
}

#[test]
fn test_horizon_stops_bus() {
    let generator = generator();
    let flights = vec![flight(1, "B", 60, 10), flight(2, "C", 60, 10)];
    let buses = vec![bus(1, "A")];

    let schedule = generator
        .generate(&flights, &buses, t0(), Some(t0() + minutes(1)))
        .unwrap();

    // After the first task the bus is free at t0+2 > horizon.
    assert_eq!(schedule.tasks.len(), 1);
}

#[test]
fn test_unreachable_destination_is_skipped() {
    let graph = Arc::new(
        LocationGraph::build(
            ["A", "B", "D"].map(Location::from),
            vec![Edge::new("A", "B", 1.0)],
        )
        .unwrap(),
    );
    let generator = ScheduleGenerator::new(graph, GeneratorParams::default());
    let flights = vec![flight(1, "D", 600, 10), flight(2, "B", 600, 10)];

    let schedule = generator.generate(&flights, &[bus(1, "A")], t0(), None).unwrap();

    assert_eq!(schedule.tasks.len(), 1);
    assert_eq!(schedule.tasks[0].flight_id, FlightId::new(2));
    assert_eq!(schedule.unserved[0].flight_id, FlightId::new(1));
}

#[test]
fn test_empty_inputs_yield_empty_schedule() {
    let generator = generator();
    let none = generator.generate(&[], &[bus(1, "A")], t0(), None).unwrap();
    assert!(none.is_empty());

    let flights = vec![flight(1, "B", 60, 10)];
    let idle = generator.generate(&flights, &[], t0(), None).unwrap();
    assert!(idle.is_empty());
    assert_eq!(idle.unserved.len(), 1);
}

#[test]
fn test_negative_passenger_count_is_rejected() {
    let err = generator()
        .generate(&[flight(3, "B", 60, -5)], &[bus(1, "A")], t0(), None)
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::NegativePassengerCount {
            flight_id: FlightId::new(3),
            count: -5,
        }
    );
    assert!(err.to_string().contains("flight 3"));
}

#[test]
fn test_bus_at_unknown_location_is_rejected() {
    let err = generator()
        .generate(&[flight(1, "B", 60, 5)], &[bus(4, "Z")], t0(), None)
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownBusLocation {
            bus_id: BusId::new(4),
            location: Location::from("Z"),
        }
    );
}

#[test]
fn test_out_of_service_bus_at_unknown_location_is_ignored() {
    let buses = vec![bus(4, "Depot").with_status(BusStatus::OutOfService)];
    let schedule = generator()
        .generate(&[flight(1, "B", 60, 5)], &buses, t0(), None)
        .unwrap();
    assert!(schedule.is_empty());
}

#[test]
fn test_flight_at_unknown_location_is_rejected() {
    let err = generator()
        .generate(&[flight(2, "Q", 60, 5)], &[bus(1, "A")], t0(), None)
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownFlightDestination { flight_id, .. } if flight_id == FlightId::new(2)));
}

#[test]
fn test_duplicate_records_are_rejected() {
    let generator = generator();
    let err = generator
        .generate(&[flight(1, "B", 60, 5), flight(1, "C", 60, 5)], &[], t0(), None)
        .unwrap_err();
    assert_eq!(err, ValidationError::DuplicateFlight(FlightId::new(1)));

    let err = generator
        .generate(&[], &[bus(2, "A"), bus(2, "B")], t0(), None)
        .unwrap_err();
    assert_eq!(err, ValidationError::DuplicateBus(BusId::new(2)));
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let zero = ScheduleGenerator::new(
        apron(),
        GeneratorParams {
            bus_capacity: 0,
            bus_speed_kmh: 45.0,
        },
    );
    assert!(matches!(
        zero.generate(&[], &[], t0(), None),
        Err(ValidationError::InvalidParameter { name: "bus_capacity", .. })
    ));

    let stopped = ScheduleGenerator::new(
        apron(),
        GeneratorParams {
            bus_capacity: 30,
            bus_speed_kmh: 0.0,
        },
    );
    assert!(stopped.generate(&[], &[], t0(), None).is_err());
}

#[test]
fn test_input_order_does_not_change_output() {
    let generator = generator();
    let flights = vec![
        flight(1, "B", 20, 45),
        flight(2, "C", 30, 15),
        flight(3, "A", 40, 70),
    ];
    let buses = vec![bus(1, "A"), bus(2, "B"), bus(3, "C")];

    let forward = generator.generate(&flights, &buses, t0(), None).unwrap();
    let mut reversed_flights = flights.clone();
    reversed_flights.reverse();
    let mut reversed_buses = buses.clone();
    reversed_buses.reverse();
    let backward = generator
        .generate(&reversed_flights, &reversed_buses, t0(), None)
        .unwrap();

    assert_eq!(forward, backward);
    assert_invariants(&generator, &flights, &buses, &forward.tasks);
}

fn location_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("A"), Just("B"), Just("C")]
}

fn snapshot_strategy() -> impl Strategy<Value = (Vec<Flight>, Vec<Bus>)> {
    let flights = prop::collection::vec(
        (location_strategy(), 0i64..120, 0i32..120, any::<bool>()),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (dest, deadline, passengers, cancelled))| {
                let f = flight(i as i64 + 1, dest, deadline, passengers);
                if cancelled && passengers % 7 == 0 {
                    f.with_status(FlightStatus::Cancelled)
                } else {
                    f
                }
            })
            .collect::<Vec<_>>()
    });
    let buses = prop::collection::vec((location_strategy(), 0i64..30), 0..8).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (position, delay))| bus(i as i64 + 1, position).available_from(t0() + minutes(delay)))
            .collect::<Vec<_>>()
    });
    (flights, buses)
}

proptest! {
    #[test]
    fn prop_generation_is_deterministic_and_consistent((flights, buses) in snapshot_strategy()) {
        let generator = generator();
        let first = generator.generate(&flights, &buses, t0(), None).unwrap();
        let second = generator.generate(&flights, &buses, t0(), None).unwrap();

        prop_assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_invariants(&generator, &flights, &buses, &first.tasks);

        let assigned: u64 = first.passengers_assigned();
        let left: u64 = first.unserved.iter().map(|u| u64::from(u.remaining)).sum();
        let demand: u64 = flights
            .iter()
            .filter(|f| f.needs_transport())
            .map(|f| f.passenger_count as u64)
            .sum();
        prop_assert_eq!(assigned + left, demand);
    }
}
