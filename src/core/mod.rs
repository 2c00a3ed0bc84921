//! Core allocation abstractions: ledger, gate lines, sinks, and the allocator.

pub mod allocator;
pub mod channel;
pub mod error;
pub mod pending;
pub mod record;
pub mod sink;

mod ledger;

pub use allocator::{AllocatorStats, LotAllocator, LotInfo, ShutdownReport};
pub use channel::{ChannelQueue, GateHandler, GateStats};
pub use error::{AllocatorError, AppResult};
pub use pending::Pending;
pub use record::{Direction, Gate, OccupancyRecord, Outcome};
pub use sink::{EventSink, InMemoryEventSink, SinkEvent, TracingEventSink};
