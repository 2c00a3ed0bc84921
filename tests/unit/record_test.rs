//! Tests for the occupancy data model

use prometheus_parking_manager::core::{Direction, Gate, OccupancyRecord, Outcome};
use std::collections::HashSet;

#[test]
fn test_gate_display() {
    assert_eq!(Gate::entry(0).to_string(), "entry-0");
    assert_eq!(Gate::exit(7).to_string(), "exit-7");
    assert_eq!(Gate::exit(7).direction, Direction::Exit);
}

#[test]
fn test_record_identity_is_resource_id() {
    let mut a = OccupancyRecord::new("ABC");
    a.entered_at_ms = Some(1);
    let b = OccupancyRecord::new("ABC");
    assert_eq!(a, b);

    let set: HashSet<OccupancyRecord> = [a, b, OccupancyRecord::new("XYZ")].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_fresh_record_is_not_occupying() {
    let record = OccupancyRecord::new("ABC");
    assert!(!record.is_occupying());
    assert!(record.ticket_id.is_none());
}

#[test]
fn test_record_json_shape() {
    let json = serde_json::to_value(OccupancyRecord::new("ABC")).expect("serialize");
    assert_eq!(json["resourceId"], "ABC");
    assert!(json["ticketId"].is_null());
    assert!(json["exitedAtMs"].is_null());
}

#[test]
fn test_outcome_success() {
    assert!(Outcome::Admitted.is_success());
    assert!(Outcome::Released.is_success());
    assert!(!Outcome::RejectedFull.is_success());
    assert!(!Outcome::RejectedNotFound.is_success());
}
