//! Error types for allocator operations.

use thiserror::Error;

use super::record::{Direction, Gate};

/// Errors produced by the allocator.
///
/// Every variant is terminal: the allocator never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocatorError {
    /// Gate index outside `0..count` for its direction.
    #[error("{direction} gate {gate} does not exist (valid: 0..{count})")]
    InvalidChannel {
        /// Direction of the requested gate.
        direction: Direction,
        /// Requested index.
        gate: usize,
        /// Number of gates configured for that direction.
        count: usize,
    },
    /// The resource already occupies a slot.
    #[error("resource `{0}` is already parked")]
    DuplicateResource(String),
    /// Every slot is taken.
    #[error("capacity exceeded: all {capacity} slots are occupied")]
    CapacityExceeded {
        /// Configured capacity.
        capacity: usize,
    },
    /// Release of a resource that holds no slot.
    #[error("resource `{0}` is not parked")]
    NotFound(String),
    /// The allocator has been shut down.
    #[error("allocator is closed")]
    Closed,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A gate worker thread could not be started.
    #[error("failed to start worker for gate {gate}: {reason}")]
    WorkerStart {
        /// Gate whose worker failed.
        gate: Gate,
        /// OS error text.
        reason: String,
    },
}

impl AllocatorError {
    /// Whether the ledger refused the request (as opposed to a routing or
    /// lifecycle failure).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateResource(_) | Self::CapacityExceeded { .. } | Self::NotFound(_)
        )
    }

    /// HTTP-style status used by the service facade.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Closed => 503,
            Self::InvalidConfig(_) | Self::WorkerStart { .. } => 500,
            _ => 400,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
