//! Clock and telemetry utilities shared across the crate.

pub mod clock;
pub mod telemetry;

pub use clock::now_ms;
pub use telemetry::{init_tracing, DEFAULT_LOG_FILTER};
