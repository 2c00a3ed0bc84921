//! Tests for the service facade

use prometheus_parking_manager::config::LotConfig;
use prometheus_parking_manager::core::LotAllocator;
use prometheus_parking_manager::service::{ParkingService, PassageRequest};
use std::sync::Arc;
use std::time::Duration;

fn service(capacity: usize) -> ParkingService {
    let lot = LotAllocator::with_tracing_sink(
        LotConfig::new()
            .with_capacity(capacity)
            .with_entry_count(2)
            .with_exit_count(2),
    )
    .expect("Failed to create allocator");
    ParkingService::new(Arc::new(lot))
}

#[tokio::test]
async fn test_enter_and_exit() {
    let svc = service(2);

    let ticket = svc
        .enter(&PassageRequest::new("ABC-123", "1"))
        .await
        .expect("enter");
    assert_eq!(
        svc.allocator().lookup("ABC-123").and_then(|r| r.ticket_id),
        Some(ticket.ticket_id)
    );
    assert_eq!(svc.parked(), vec!["ABC-123".to_string()]);

    svc.exit(&PassageRequest::new("ABC-123", 0)).await.expect("exit");
    assert!(svc.parked().is_empty());
}

#[tokio::test]
async fn test_resource_id_passed_through_verbatim() {
    let svc = service(3);
    svc.enter(&PassageRequest::new("A", "0")).await.expect("enter A");
    svc.enter(&PassageRequest::new(" A", "1")).await.expect("enter padded A");

    assert_eq!(svc.parked(), vec![" A".to_string(), "A".to_string()]);

    let missing = svc.exit(&PassageRequest::new("A ", "0")).await.unwrap_err();
    assert_eq!(missing.message, "resource `A ` is not parked");

    let empty = svc.enter(&PassageRequest::new("", "0")).await.unwrap_err();
    assert_eq!(empty.error_code, 400);
}

#[tokio::test]
async fn test_errors_map_to_codes() {
    let svc = service(1);
    svc.enter(&PassageRequest::new("A", "0")).await.expect("enter");

    let full = svc.enter(&PassageRequest::new("B", "0")).await.unwrap_err();
    assert_eq!(full.error_code, 400);

    let bad_gate = svc.enter(&PassageRequest::new("B", "5")).await.unwrap_err();
    assert_eq!(bad_gate.error_code, 400);
    assert!(bad_gate.message.contains("entry gate 5"));

    let negative = svc.exit(&PassageRequest::new("A", "-1")).await.unwrap_err();
    assert_eq!(negative.error_code, 400);

    let missing = svc.exit(&PassageRequest::new("NOPE", "1")).await.unwrap_err();
    assert_eq!(missing.message, "resource `NOPE` is not parked");
}

#[tokio::test]
async fn test_closed_maps_to_503() {
    let svc = service(1);
    assert!(svc.health().ok);

    svc.allocator().shutdown(Duration::from_secs(5));
    assert!(!svc.health().ok);

    let err = svc.enter(&PassageRequest::new("A", "0")).await.unwrap_err();
    assert_eq!(err.error_code, 503);
}

#[test]
fn test_info_body() {
    let svc = service(7);
    let json = serde_json::to_value(svc.info()).expect("serialize");
    assert_eq!(json["maxCapacity"], 7);
    assert_eq!(json["currentCapacity"], 0);
    assert_eq!(json["capacityLeft"], 7);
    assert_eq!(json["entryCount"], 2);
    assert_eq!(json["exitCount"], 2);
}

#[test]
fn test_request_body_shape() {
    let req: PassageRequest =
        serde_json::from_str(r#"{"resourceId": "XY-9", "gateId": "3"}"#).expect("deserialize");
    assert_eq!(req.resource_id, "XY-9");
    assert_eq!(req.gate_id, "3");
}
