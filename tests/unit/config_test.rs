//! Tests for configuration validation and loading

use prometheus_parking_manager::config::{
    LotConfig, ENV_ENTRY_COUNT, ENV_EXIT_COUNT, ENV_MAX_SLOT, ENV_SHUTDOWN_TIMEOUT_SECS,
};
use std::time::Duration;

#[test]
fn test_lot_config_validation() {
    let valid = LotConfig::new()
        .with_capacity(100)
        .with_entry_count(3)
        .with_exit_count(2);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_lot_config_invalid_capacity() {
    let invalid = LotConfig::new().with_capacity(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_lot_config_invalid_gates() {
    assert!(LotConfig::new().with_entry_count(0).validate().is_err());
    assert!(LotConfig::new().with_exit_count(0).validate().is_err());
}

#[test]
fn test_lot_config_invalid_sink_timeout() {
    let invalid = LotConfig::new().with_sink_timeout(Duration::ZERO);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_lot_config_invalid_stack_size() {
    let invalid = LotConfig::new().with_thread_stack_size(1024);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_lot_config_json_defaults() {
    let cfg = LotConfig::from_json_str(r#"{"capacity": 10, "entry_count": 2, "exit_count": 1}"#)
        .expect("valid config");
    assert_eq!(cfg.capacity, 10);
    assert_eq!(cfg.sink_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.shutdown_timeout(), Duration::from_secs(60));
    assert_eq!(cfg.thread_stack_size, 256 * 1024);
}

#[test]
fn test_lot_config_json_rejects_invalid() {
    assert!(LotConfig::from_json_str(r#"{"capacity": 0, "entry_count": 1, "exit_count": 1}"#).is_err());
    assert!(LotConfig::from_json_str("not json").is_err());
}

#[test]
fn test_lot_config_lookup_overrides() {
    let cfg = LotConfig::from_lookup(|key| match key {
        k if k == ENV_MAX_SLOT => Some("8".to_string()),
        k if k == ENV_ENTRY_COUNT => Some("2".to_string()),
        k if k == ENV_EXIT_COUNT => Some("2".to_string()),
        k if k == ENV_SHUTDOWN_TIMEOUT_SECS => Some("15".to_string()),
        _ => None,
    })
    .expect("valid lookup");
    assert_eq!(cfg.gate_count(), 4);
    assert_eq!(cfg.shutdown_timeout(), Duration::from_secs(15));
}

#[test]
fn test_lot_config_lookup_zero_rejected() {
    let err = LotConfig::from_lookup(|key| {
        Some(if key == ENV_MAX_SLOT { "0" } else { "1" }.to_string())
    })
    .unwrap_err();
    assert!(err.to_string().contains("capacity"));
}

#[test]
fn test_lot_config_sub_second_shutdown_budget() {
    let cfg = LotConfig::new().with_shutdown_timeout(Duration::from_millis(500));
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.shutdown_timeout(), Duration::from_millis(500));
}

#[test]
fn test_lot_config_max_shutdown_budget() {
    let cfg = LotConfig::from_lookup(|key| {
        Some(if key == ENV_SHUTDOWN_TIMEOUT_SECS {
            u64::MAX.to_string()
        } else {
            "1".to_string()
        })
    })
    .expect("valid lookup");
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.shutdown_timeout_ms, u64::MAX);

    let unbounded = LotConfig::new().with_shutdown_timeout(Duration::MAX);
    assert_eq!(unbounded.shutdown_timeout_ms, u64::MAX);
}
