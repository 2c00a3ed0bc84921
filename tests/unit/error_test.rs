//! Tests for error types

use prometheus_parking_manager::core::{AllocatorError, Direction, Gate};

#[test]
fn test_capacity_exceeded_error() {
    let err = AllocatorError::CapacityExceeded { capacity: 50 };
    assert_eq!(
        format!("{}", err),
        "capacity exceeded: all 50 slots are occupied"
    );
}

#[test]
fn test_duplicate_resource_error() {
    let err = AllocatorError::DuplicateResource("ABC-123".to_string());
    assert_eq!(format!("{}", err), "resource `ABC-123` is already parked");
}

#[test]
fn test_invalid_channel_error() {
    let err = AllocatorError::InvalidChannel {
        direction: Direction::Exit,
        gate: 4,
        count: 2,
    };
    assert_eq!(
        format!("{}", err),
        "exit gate 4 does not exist (valid: 0..2)"
    );
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_closed_error() {
    let err = AllocatorError::Closed;
    assert_eq!(format!("{}", err), "allocator is closed");
    assert_eq!(err.status_code(), 503);
    assert!(!err.is_rejection());
}

#[test]
fn test_worker_start_error() {
    let err = AllocatorError::WorkerStart {
        gate: Gate::entry(3),
        reason: "out of threads".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "failed to start worker for gate entry-3: out of threads"
    );
    assert_eq!(err.status_code(), 500);
}

#[test]
fn test_invalid_config_error() {
    let err = AllocatorError::InvalidConfig("capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: capacity must be greater than 0"
    );
    assert_eq!(err.status_code(), 500);
}
