//! The capacity-bounded allocator.
//!
//! `LotAllocator` owns the ledger, one execution line per gate, and the
//! event sink. Requests are validated on the caller's thread, queued on
//! their gate, and executed by that gate's worker:
//!
//! 1. take the ledger write lock, check identity and capacity, mutate;
//! 2. release the lock;
//! 3. notify the sink (bounded by the configured sink timeout);
//! 4. resolve the caller's [`Pending`] handle.
//!
//! Queries only take the read lock and never wait on gate workers.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_parking_manager::config::LotConfig;
//! use prometheus_parking_manager::core::{LotAllocator, TracingEventSink};
//!
//! let lot = LotAllocator::new(
//!     LotConfig::new().with_capacity(50).with_entry_count(5).with_exit_count(2),
//!     Arc::new(TracingEventSink),
//! )?;
//!
//! let ticket = lot.admit(0, "ABC-123")?.await?;
//! lot.release(1, "ABC-123")?.await?;
//! lot.shutdown(Duration::from_secs(5));
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::channel::{ChannelQueue, GateHandler, GateStats};
use super::error::AllocatorError;
use super::ledger::{InsertRefusal, Ledger};
use super::pending::{Pending, Reply};
use super::record::{Direction, Gate, OccupancyRecord, Outcome};
use super::sink::{EventSink, TracingEventSink};
use crate::config::LotConfig;
use crate::util::clock::now_ms;

/// A request travelling through a gate's execution line.
pub(crate) enum GateRequest {
    Admit {
        resource_id: String,
        reply: Reply<Uuid>,
    },
    Release {
        resource_id: String,
        reply: Reply<()>,
    },
}

impl GateRequest {
    fn resource_id(&self) -> &str {
        match self {
            Self::Admit { resource_id, .. } | Self::Release { resource_id, .. } => resource_id,
        }
    }
}

/// State shared between the allocator handle and its gate workers.
struct LotState {
    capacity: usize,
    ledger: RwLock<Ledger>,
    sink: Arc<dyn EventSink>,
    sink_timeout: Duration,
}

impl LotState {
    fn admit_now(&self, resource_id: String) -> (Result<Uuid, AllocatorError>, OccupancyRecord, Outcome) {
        let ticket = Uuid::new_v4();
        let record = OccupancyRecord::admitted(resource_id, ticket, now_ms());
        let stored = record.clone();

        let inserted = self.ledger.write().try_insert(stored);

        match inserted {
            Ok(()) => (Ok(ticket), record, Outcome::Admitted),
            Err(InsertRefusal::Duplicate) => {
                let resource_id = record.resource_id().to_owned();
                (
                    Err(AllocatorError::DuplicateResource(resource_id.clone())),
                    OccupancyRecord::new(resource_id),
                    Outcome::RejectedDuplicate,
                )
            }
            Err(InsertRefusal::Full) => (
                Err(AllocatorError::CapacityExceeded {
                    capacity: self.capacity,
                }),
                OccupancyRecord::new(record.resource_id()),
                Outcome::RejectedFull,
            ),
        }
    }

    fn release_now(&self, resource_id: String) -> (Result<(), AllocatorError>, OccupancyRecord, Outcome) {
        let removed = self.ledger.write().remove(&resource_id);

        match removed {
            Some(mut record) => {
                record.exited_at_ms = Some(now_ms());
                (Ok(()), record, Outcome::Released)
            }
            None => (
                Err(AllocatorError::NotFound(resource_id.clone())),
                OccupancyRecord::new(resource_id),
                Outcome::RejectedNotFound,
            ),
        }
    }

    /// Deliver one notification. Sink trouble is logged, never propagated.
    async fn notify(&self, gate: Gate, record: OccupancyRecord, outcome: Outcome) {
        let sink = Arc::clone(&self.sink);
        let resource_id = record.resource_id().to_owned();
        let mut delivery = tokio::spawn(async move { sink.notify(&record, outcome).await });

        match tokio::time::timeout(self.sink_timeout, &mut delivery).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                warn!(gate = %gate, resource_id = %resource_id, ?outcome, "Event sink rejected notification");
            }
            Ok(Err(e)) => {
                error!(gate = %gate, resource_id = %resource_id, ?outcome, error = %e, "Event sink failed");
            }
            Err(_) => {
                delivery.abort();
                warn!(
                    gate = %gate,
                    resource_id = %resource_id,
                    ?outcome,
                    timeout_ms = self.sink_timeout.as_millis(),
                    "Event sink timed out"
                );
            }
        }
    }
}

#[async_trait]
impl GateHandler<GateRequest> for LotState {
    async fn handle(&self, gate: Gate, job: GateRequest) {
        match job {
            GateRequest::Admit { resource_id, reply } => {
                let (result, record, outcome) = self.admit_now(resource_id);
                debug!(gate = %gate, resource_id = record.resource_id(), ?outcome, "Admission processed");
                self.notify(gate, record, outcome).await;
                let _ = reply.send(result);
            }
            GateRequest::Release { resource_id, reply } => {
                let (result, record, outcome) = self.release_now(resource_id);
                debug!(gate = %gate, resource_id = record.resource_id(), ?outcome, "Release processed");
                self.notify(gate, record, outcome).await;
                let _ = reply.send(result);
            }
        }
    }

    fn cancel(&self, gate: Gate, job: GateRequest) {
        debug!(gate = %gate, resource_id = job.resource_id(), "Request cancelled by shutdown");
        match job {
            GateRequest::Admit { reply, .. } => {
                let _ = reply.send(Err(AllocatorError::Closed));
            }
            GateRequest::Release { reply, .. } => {
                let _ = reply.send(Err(AllocatorError::Closed));
            }
        }
    }
}

/// Occupancy summary taken under a single read lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotInfo {
    /// Configured capacity.
    pub max_capacity: usize,
    /// Slots currently occupied.
    pub current_capacity: usize,
    /// Slots still free.
    pub capacity_left: usize,
    /// Number of entry gates.
    pub entry_count: usize,
    /// Number of exit gates.
    pub exit_count: usize,
}

/// Counters across every gate.
#[derive(Debug, Clone)]
pub struct AllocatorStats {
    /// Configured capacity.
    pub capacity: usize,
    /// Slots occupied when the snapshot was taken.
    pub occupied: usize,
    /// Per-gate counters, entry gates first.
    pub gates: Vec<GateStats>,
}

impl AllocatorStats {
    /// Counters for one gate.
    #[must_use]
    pub fn gate(&self, gate: Gate) -> Option<&GateStats> {
        self.gates.iter().find(|s| s.gate == gate)
    }

    /// Requests accepted on all gates.
    #[must_use]
    pub fn total_submitted(&self) -> u64 {
        self.gates.iter().map(|s| s.submitted).sum()
    }

    /// Requests executed on all gates.
    #[must_use]
    pub fn total_completed(&self) -> u64 {
        self.gates.iter().map(|s| s.completed).sum()
    }

    /// Requests failed by shutdown on all gates.
    #[must_use]
    pub fn total_cancelled(&self) -> u64 {
        self.gates.iter().map(|s| s.cancelled).sum()
    }
}

/// What `shutdown` managed to do within its budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// The allocator was already closed; nothing was done.
    pub already_closed: bool,
    /// Requests failed with `Closed` instead of running.
    pub cancelled: usize,
    /// Gates whose worker was still busy at the deadline.
    pub stalled_gates: Vec<Gate>,
    /// Requests still executing on stalled gates when the call returned.
    pub abandoned_in_flight: u64,
    /// Wall time spent.
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// Every gate finished its work before the deadline.
    #[must_use]
    pub fn drained(&self) -> bool {
        self.stalled_gates.is_empty()
    }
}

/// Concurrent capacity-bounded allocator with one FIFO line per gate.
pub struct LotAllocator {
    config: LotConfig,
    state: Arc<LotState>,
    entries: Vec<ChannelQueue<GateRequest, LotState>>,
    exits: Vec<ChannelQueue<GateRequest, LotState>>,
    closed: AtomicBool,
}

impl LotAllocator {
    /// Validate `config` and start one worker thread per gate.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a rejected configuration, `WorkerStart` if a gate
    /// thread cannot be spawned (already started gates wind down on drop).
    pub fn new(config: LotConfig, sink: Arc<dyn EventSink>) -> Result<Self, AllocatorError> {
        config.validate().map_err(AllocatorError::InvalidConfig)?;

        let state = Arc::new(LotState {
            capacity: config.capacity,
            ledger: RwLock::new(Ledger::new(config.capacity)),
            sink,
            sink_timeout: config.sink_timeout(),
        });

        let spawn_lines = |direction: Direction, count: usize| {
            (0..count)
                .map(|index| {
                    ChannelQueue::<GateRequest, LotState>::spawn(
                        Gate { direction, index },
                        Arc::clone(&state),
                        config.thread_stack_size,
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let entries = spawn_lines(Direction::Entry, config.entry_count)?;
        let exits = spawn_lines(Direction::Exit, config.exit_count)?;

        info!(
            capacity = config.capacity,
            entry_count = config.entry_count,
            exit_count = config.exit_count,
            sink_timeout_ms = config.sink_timeout_ms,
            "LotAllocator initialized with one worker thread per gate"
        );

        Ok(Self {
            config,
            state,
            entries,
            exits,
            closed: AtomicBool::new(false),
        })
    }

    /// Allocator that reports events through `tracing`.
    ///
    /// # Errors
    ///
    /// Same as [`LotAllocator::new`].
    pub fn with_tracing_sink(config: LotConfig) -> Result<Self, AllocatorError> {
        Self::new(config, Arc::new(TracingEventSink))
    }

    /// Queue an admission of `resource_id` on entry gate `entry_gate`.
    ///
    /// Returns as soon as the request is queued; the handle resolves with
    /// the issued ticket, `DuplicateResource`, or `CapacityExceeded`.
    ///
    /// # Errors
    ///
    /// `Closed` after shutdown, `InvalidChannel` for an unknown gate. Both
    /// are reported before anything is queued.
    pub fn admit(
        &self,
        entry_gate: usize,
        resource_id: impl Into<String>,
    ) -> Result<Pending<Uuid>, AllocatorError> {
        let line = self.line(Direction::Entry, entry_gate)?;
        let (reply, pending) = Pending::channel();
        line.submit(GateRequest::Admit {
            resource_id: resource_id.into(),
            reply,
        })?;
        Ok(pending)
    }

    /// Queue a release of `resource_id` on exit gate `exit_gate`.
    ///
    /// The handle resolves with `()` or `NotFound`.
    ///
    /// # Errors
    ///
    /// `Closed` after shutdown, `InvalidChannel` for an unknown gate.
    pub fn release(
        &self,
        exit_gate: usize,
        resource_id: impl Into<String>,
    ) -> Result<Pending<()>, AllocatorError> {
        let line = self.line(Direction::Exit, exit_gate)?;
        let (reply, pending) = Pending::channel();
        line.submit(GateRequest::Release {
            resource_id: resource_id.into(),
            reply,
        })?;
        Ok(pending)
    }

    fn line(
        &self,
        direction: Direction,
        index: usize,
    ) -> Result<&ChannelQueue<GateRequest, LotState>, AllocatorError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AllocatorError::Closed);
        }
        let lines = match direction {
            Direction::Entry => &self.entries,
            Direction::Exit => &self.exits,
        };
        lines.get(index).ok_or(AllocatorError::InvalidChannel {
            direction,
            gate: index,
            count: lines.len(),
        })
    }

    fn lines(&self) -> impl Iterator<Item = &ChannelQueue<GateRequest, LotState>> {
        self.entries.iter().chain(self.exits.iter())
    }

    /// Slots currently occupied.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.state.ledger.read().occupied()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.ledger.read().capacity()
    }

    /// Slots still free.
    #[must_use]
    pub fn capacity_left(&self) -> usize {
        self.state.ledger.read().available()
    }

    /// Resource ids currently occupying a slot.
    #[must_use]
    pub fn snapshot(&self) -> HashSet<String> {
        self.state.ledger.read().resource_ids()
    }

    /// The occupant record for `resource_id`, if parked.
    #[must_use]
    pub fn lookup(&self, resource_id: &str) -> Option<OccupancyRecord> {
        self.state.ledger.read().get(resource_id).cloned()
    }

    /// Whether `resource_id` currently holds a slot.
    #[must_use]
    pub fn is_occupying(&self, resource_id: &str) -> bool {
        self.state.ledger.read().contains(resource_id)
    }

    /// Occupancy summary from one consistent read.
    #[must_use]
    pub fn info(&self) -> LotInfo {
        let ledger = self.state.ledger.read();
        LotInfo {
            max_capacity: ledger.capacity(),
            current_capacity: ledger.occupied(),
            capacity_left: ledger.available(),
            entry_count: self.entries.len(),
            exit_count: self.exits.len(),
        }
    }

    /// Number of entry gates.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of exit gates.
    #[must_use]
    pub fn exit_count(&self) -> usize {
        self.exits.len()
    }

    /// Configuration the allocator was built with.
    #[must_use]
    pub const fn config(&self) -> &LotConfig {
        &self.config
    }

    /// Whether `shutdown` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Per-gate counters plus current occupancy.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        let occupied = self.occupied_count();
        AllocatorStats {
            capacity: self.config.capacity,
            occupied,
            gates: self.lines().map(ChannelQueue::stats).collect(),
        }
    }

    /// Stop accepting requests and drain every gate within `timeout`.
    ///
    /// Queued requests keep running until the shared deadline. Gates still
    /// busy at the deadline have their remaining queue failed with `Closed`
    /// before this returns; a request already executing on such a gate
    /// cannot be interrupted and is counted in
    /// [`ShutdownReport::abandoned_in_flight`]. A `timeout` of
    /// `Duration::MAX` waits for every gate. Later calls return immediately
    /// with `already_closed` set.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        let started = Instant::now();
        if self.closed.swap(true, Ordering::AcqRel) {
            return ShutdownReport {
                already_closed: true,
                ..ShutdownReport::default()
            };
        }

        info!(timeout_ms = timeout.as_millis(), "Shutting down lot allocator");

        for line in self.lines() {
            line.close();
        }

        // A budget too large to represent as an instant means no deadline.
        let deadline = started.checked_add(timeout);
        let mut report = ShutdownReport::default();
        for line in self.lines() {
            let exited = line.await_drained(deadline);
            // Normally empty; leftovers mean the worker stalled or panicked.
            report.cancelled += line.abort();
            if !exited {
                report.stalled_gates.push(line.gate());
                report.abandoned_in_flight += line.stats().in_flight();
            }
        }
        report.elapsed = started.elapsed();

        if report.drained() {
            info!(
                cancelled = report.cancelled,
                elapsed_ms = report.elapsed.as_millis(),
                "Lot allocator shut down"
            );
        } else {
            warn!(
                stalled = report.stalled_gates.len(),
                cancelled = report.cancelled,
                abandoned_in_flight = report.abandoned_in_flight,
                timeout_ms = timeout.as_millis(),
                "Shutdown timed out; stalled gates detached"
            );
        }
        report
    }

    /// [`shutdown`](Self::shutdown) with the configured default budget.
    pub fn shutdown_default(&self) -> ShutdownReport {
        self.shutdown(self.config.shutdown_timeout())
    }
}

impl Drop for LotAllocator {
    fn drop(&mut self) {
        // Gate lines close their intake on drop; workers finish queued work
        // and exit without being joined.
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("LotAllocator dropped without explicit shutdown - gate workers will be detached");
        }
    }
}

impl std::fmt::Debug for LotAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LotAllocator")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
