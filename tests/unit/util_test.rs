//! Tests for utility functions

use prometheus_parking_manager::util::{init_tracing, now_ms, DEFAULT_LOG_FILTER};

#[test]
fn test_now_ms_is_after_2020() {
    // 2020-01-01T00:00:00Z
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_twice() {
    init_tracing();
    init_tracing();
    assert!(DEFAULT_LOG_FILTER.starts_with("prometheus_parking_manager"));
}
