//! Occupancy data model: records, gates, and notification outcomes.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of travel through a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Intake gate; requests arriving here are admissions.
    Entry,
    /// Release gate; requests arriving here are releases.
    Exit,
}

impl Direction {
    /// Lowercase label used in logs, thread names, and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single gate: one execution line of the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gate {
    /// Entry or exit.
    pub direction: Direction,
    /// Zero-based index within its direction.
    pub index: usize,
}

impl Gate {
    /// Entry gate `index`.
    #[must_use]
    pub const fn entry(index: usize) -> Self {
        Self {
            direction: Direction::Entry,
            index,
        }
    }

    /// Exit gate `index`.
    #[must_use]
    pub const fn exit(index: usize) -> Self {
        Self {
            direction: Direction::Exit,
            index,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.direction, self.index)
    }
}

/// Result of a request as reported to the event sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The resource took a slot.
    Admitted,
    /// The resource gave its slot back.
    Released,
    /// Admission refused: no slot left.
    RejectedFull,
    /// Admission refused: the resource already holds a slot.
    RejectedDuplicate,
    /// Release refused: the resource holds no slot.
    RejectedNotFound,
}

impl Outcome {
    /// Whether the outcome changed the ledger.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Admitted | Self::Released)
    }
}

/// One occupant of the lot.
///
/// Identity is the `resource_id` alone: two records with the same token are
/// equal and hash identically whatever their ticket or timestamps say.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyRecord {
    resource_id: String,
    /// Ticket issued on admission.
    pub ticket_id: Option<Uuid>,
    /// Admission time, milliseconds since the Unix epoch.
    pub entered_at_ms: Option<u128>,
    /// Release time, milliseconds since the Unix epoch.
    pub exited_at_ms: Option<u128>,
}

impl OccupancyRecord {
    /// A fresh, not-yet-admitted record.
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            ticket_id: None,
            entered_at_ms: None,
            exited_at_ms: None,
        }
    }

    /// A record stamped for admission.
    pub(crate) fn admitted(resource_id: String, ticket_id: Uuid, entered_at_ms: u128) -> Self {
        Self {
            resource_id,
            ticket_id: Some(ticket_id),
            entered_at_ms: Some(entered_at_ms),
            exited_at_ms: None,
        }
    }

    /// The identity token.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Whether the record currently describes an occupant.
    #[must_use]
    pub const fn is_occupying(&self) -> bool {
        self.ticket_id.is_some() && self.exited_at_ms.is_none()
    }
}

impl PartialEq for OccupancyRecord {
    fn eq(&self, other: &Self) -> bool {
        self.resource_id == other.resource_id
    }
}

impl Eq for OccupancyRecord {}

impl Hash for OccupancyRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.resource_id.hash(state);
    }
}
