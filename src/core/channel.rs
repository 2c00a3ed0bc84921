//! Per-gate execution lines.
//!
//! Each gate owns one dedicated OS thread fed by an unbounded channel, so
//! requests on a gate run strictly one at a time in submission order while
//! different gates run in parallel. Every worker drives its handler on its
//! own single-threaded tokio runtime, which keeps sink I/O off the caller's
//! runtime.
//!
//! # Lifecycle
//!
//! - **Intake**: the sender lives behind a mutex; `close` drops it, after
//!   which `submit` fails with `Closed` and the worker exits once its
//!   backlog is empty.
//! - **Drain**: `await_drained` waits for the worker to exit, up to a
//!   deadline, without polling (a disconnect on a never-written channel).
//! - **Abort**: `abort` makes the worker cancel instead of run, and cancels
//!   whatever is still queued from the calling thread.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::error::AllocatorError;
use super::record::Gate;

/// Work executor for a gate.
///
/// `handle` runs queued work on the gate's worker thread; `cancel` is
/// called instead for work that will never run because of shutdown, and
/// may be called from the thread performing the shutdown.
#[async_trait]
pub trait GateHandler<J>: Send + Sync + 'static
where
    J: Send + 'static,
{
    /// Execute one job.
    async fn handle(&self, gate: Gate, job: J);

    /// Fail one job without executing it.
    fn cancel(&self, gate: Gate, job: J);
}

/// Point-in-time counters for one gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStats {
    /// The gate described.
    pub gate: Gate,
    /// Jobs accepted into the queue.
    pub submitted: u64,
    /// Jobs executed to completion.
    pub completed: u64,
    /// Jobs failed without executing.
    pub cancelled: u64,
    /// Jobs waiting behind the one in flight.
    pub queued: usize,
}

impl GateStats {
    /// Jobs accepted but neither completed nor cancelled nor queued.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed)
            .saturating_sub(self.cancelled)
            .saturating_sub(self.queued as u64)
    }
}

#[derive(Debug, Default)]
struct GateCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
}

/// A strictly FIFO, single-worker execution line for one gate.
pub struct ChannelQueue<J, H>
where
    J: Send + 'static,
    H: GateHandler<J>,
{
    gate: Gate,
    tx: Mutex<Option<Sender<J>>>,
    rx: Receiver<J>,
    handler: Arc<H>,
    counters: Arc<GateCounters>,
    abort: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Disconnects when the worker thread exits.
    exited: Receiver<()>,
    _job: PhantomData<fn(J)>,
}

impl<J, H> ChannelQueue<J, H>
where
    J: Send + 'static,
    H: GateHandler<J>,
{
    /// Start the worker thread for `gate`.
    ///
    /// # Errors
    ///
    /// `WorkerStart` if the OS refuses the thread.
    pub fn spawn(gate: Gate, handler: Arc<H>, stack_size: usize) -> Result<Self, AllocatorError> {
        let (tx, rx) = unbounded::<J>();
        let (exited_tx, exited) = crossbeam_channel::bounded::<()>(0);
        let counters = Arc::new(GateCounters::default());
        let abort = Arc::new(AtomicBool::new(false));

        let worker = {
            let rx = rx.clone();
            let handler = Arc::clone(&handler);
            let counters = Arc::clone(&counters);
            let abort = Arc::clone(&abort);
            thread::Builder::new()
                .name(format!("gate-{gate}"))
                .stack_size(stack_size)
                .spawn(move || {
                    let _exited = exited_tx;
                    run_worker(gate, &rx, handler.as_ref(), &counters, &abort);
                })
                .map_err(|e| AllocatorError::WorkerStart {
                    gate,
                    reason: e.to_string(),
                })?
        };

        Ok(Self {
            gate,
            tx: Mutex::new(Some(tx)),
            rx,
            handler,
            counters,
            abort,
            worker: Mutex::new(Some(worker)),
            exited,
            _job: PhantomData,
        })
    }

    /// The gate this line serves.
    pub const fn gate(&self) -> Gate {
        self.gate
    }

    /// Append a job behind everything already submitted to this gate.
    ///
    /// # Errors
    ///
    /// `Closed` once intake has been closed; the job is dropped.
    pub fn submit(&self, job: J) -> Result<(), AllocatorError> {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(AllocatorError::Closed);
        };
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            self.counters.submitted.fetch_sub(1, Ordering::Relaxed);
            return Err(AllocatorError::Closed);
        }
        Ok(())
    }

    /// Stop accepting jobs. Already queued work still runs.
    pub fn close(&self) {
        if self.tx.lock().take().is_some() {
            debug!(gate = %self.gate, "Gate intake closed");
        }
    }

    /// Wait until the worker has run its backlog and exited, or `deadline`
    /// passes. `None` waits without limit. Returns `true` if the worker is
    /// gone.
    pub fn await_drained(&self, deadline: Option<Instant>) -> bool {
        let exited = match deadline {
            Some(deadline) => self.exited.recv_deadline(deadline),
            None => self.exited.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match exited {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(worker) = self.worker.lock().take() {
                    if worker.join().is_err() {
                        error!(gate = %self.gate, "Gate worker panicked");
                    }
                }
                true
            }
        }
    }

    /// Cancel everything still queued and make the worker cancel anything
    /// it picks up from now on. Returns how many jobs this call cancelled.
    pub fn abort(&self) -> usize {
        self.abort.store(true, Ordering::Release);
        let mut cancelled = 0;
        for job in self.rx.try_iter() {
            self.handler.cancel(self.gate, job);
            self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
            cancelled += 1;
        }
        if cancelled > 0 {
            warn!(gate = %self.gate, cancelled, "Cancelled queued gate work");
        }
        cancelled
    }

    /// Current counters.
    pub fn stats(&self) -> GateStats {
        GateStats {
            gate: self.gate,
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
            queued: self.rx.len(),
        }
    }
}

impl<J, H> Drop for ChannelQueue<J, H>
where
    J: Send + 'static,
    H: GateHandler<J>,
{
    fn drop(&mut self) {
        // Closing intake lets the worker finish its backlog and exit on its
        // own; joining here could hang on a stalled handler.
        self.close();
    }
}

fn run_worker<J, H>(
    gate: Gate,
    rx: &Receiver<J>,
    handler: &H,
    counters: &GateCounters,
    abort: &AtomicBool,
) where
    J: Send + 'static,
    H: GateHandler<J>,
{
    debug!(gate = %gate, "Gate worker started");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => Some(rt),
        Err(e) => {
            error!(gate = %gate, error = %e, "Failed to create gate runtime; cancelling its work");
            None
        }
    };

    // Ends once intake is closed and the backlog is empty.
    for job in rx.iter() {
        match &rt {
            Some(rt) if !abort.load(Ordering::Acquire) => {
                rt.block_on(handler.handle(gate, job));
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                handler.cancel(gate, job);
                counters.cancelled.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    debug!(gate = %gate, "Gate worker exiting");
}
