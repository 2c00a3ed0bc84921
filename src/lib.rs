//! # Prometheus Parking Manager
//!
//! A concurrent, capacity-bounded slot allocator for parking facilities.
//!
//! A lot has a fixed number of slots, a set of entry gates, and a set of
//! exit gates. Vehicles (or any resource with a unique id) are admitted
//! through an entry gate and released through an exit gate. Each gate runs
//! on its own dedicated worker thread, so requests on one gate are handled
//! strictly in submission order while different gates proceed in parallel.
//!
//! ## Core Guarantees
//!
//! - **Never over capacity**: the occupied count stays within `0..=capacity`
//!   under any interleaving of gates.
//! - **One slot per identity**: a resource can hold at most one slot.
//! - **Per-gate FIFO**: requests on the same gate execute in the order they
//!   were submitted.
//! - **Isolated notifications**: event sinks run outside the ledger lock and
//!   under a timeout; a failing sink never changes an operation's result.
//! - **Bounded shutdown**: intake closes immediately; queued work drains up
//!   to a deadline and anything left is failed with `Closed`.
//!
//! ## LotAllocator
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_parking_manager::config::LotConfig;
//! use prometheus_parking_manager::core::{InMemoryEventSink, LotAllocator};
//!
//! let sink = Arc::new(InMemoryEventSink::new(1_000));
//! let lot = LotAllocator::new(
//!     LotConfig::new()
//!         .with_capacity(50)
//!         .with_entry_count(5)
//!         .with_exit_count(2),
//!     sink,
//! )?;
//!
//! // Async callers await the handle...
//! let ticket = lot.admit(0, "ABC-123")?.await?;
//!
//! // ...plain threads block on it.
//! lot.release(1, "ABC-123")?.blocking_wait()?;
//!
//! let report = lot.shutdown(Duration::from_secs(10));
//! assert!(report.drained());
//! ```
//!
//! ## ParkingService
//!
//! The `service` module wraps an allocator with request/response models
//! (string gate ids, camelCase JSON bodies, HTTP-style error codes) so a
//! transport layer only has to route calls.
//!
//! For complete examples, see:
//! - `tests/allocator_test.rs` - Allocation scenarios
//! - `tests/shutdown_test.rs` - Lifecycle and drain behavior

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core allocation abstractions and capacity accounting.
pub mod core;
/// Configuration models and environment loading.
pub mod config;
/// Request/response facade over the allocator.
pub mod service;
/// Shared utilities.
pub mod util;
