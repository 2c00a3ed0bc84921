//! API-facing request/response models and the service facade.
//!
//! `ParkingService` turns loosely typed external calls (string gate ids,
//! caller-supplied resource ids) into allocator requests and maps every
//! outcome onto a serializable body. It owns no transport; an HTTP layer
//! only has to route `enter`, `exit`, `info`, and `parked` to it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::core::{AllocatorError, LotAllocator, LotInfo};

/// Status used for malformed requests and allocator rejections.
pub const BAD_REQUEST: u16 = 400;

/// Parameters of an enter or exit call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageRequest {
    /// Identity of the occupant.
    pub resource_id: String,
    /// Gate number as received, parsed by the service.
    pub gate_id: String,
}

impl PassageRequest {
    /// Build a request from raw parameters.
    pub fn new(resource_id: impl Into<String>, gate_id: impl ToString) -> Self {
        Self {
            resource_id: resource_id.into(),
            gate_id: gate_id.to_string(),
        }
    }
}

/// Successful admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    /// Ticket issued for the stay.
    pub ticket_id: Uuid,
}

/// Error body for any failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// HTTP-style status code.
    pub error_code: u16,
    /// Human-readable reason.
    pub message: String,
}

impl ErrorResponse {
    /// A 400 response with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error_code: BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<AllocatorError> for ErrorResponse {
    fn from(err: AllocatorError) -> Self {
        Self {
            error_code: err.status_code(),
            message: err.to_string(),
        }
    }
}

/// Body of the info call.
pub type InfoResponse = LotInfo;

/// Health response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag: the allocator still accepts requests.
    pub ok: bool,
}

/// Facade mapping external calls onto a shared [`LotAllocator`].
#[derive(Debug, Clone)]
pub struct ParkingService {
    lot: Arc<LotAllocator>,
}

impl ParkingService {
    /// Wrap an allocator.
    #[must_use]
    pub const fn new(lot: Arc<LotAllocator>) -> Self {
        Self { lot }
    }

    /// The wrapped allocator.
    #[must_use]
    pub const fn allocator(&self) -> &Arc<LotAllocator> {
        &self.lot
    }

    /// Admit a resource and wait for its ticket.
    ///
    /// # Errors
    ///
    /// 400 for a malformed request, an unknown gate, a duplicate, or a full
    /// lot; 503 once the allocator is closed.
    pub async fn enter(&self, req: &PassageRequest) -> Result<TicketResponse, ErrorResponse> {
        let outcome = self.try_enter(req).await;
        log_failure("enter", req, outcome)
    }

    async fn try_enter(&self, req: &PassageRequest) -> Result<TicketResponse, ErrorResponse> {
        let (resource_id, gate) = parse_passage(req)?;
        let ticket_id = self.lot.admit(gate, resource_id)?.await?;
        Ok(TicketResponse { ticket_id })
    }

    /// Release a resource and wait for completion.
    ///
    /// # Errors
    ///
    /// 400 for a malformed request, an unknown gate, or a resource that is
    /// not parked; 503 once the allocator is closed.
    pub async fn exit(&self, req: &PassageRequest) -> Result<(), ErrorResponse> {
        let outcome = self.try_exit(req).await;
        log_failure("exit", req, outcome)
    }

    async fn try_exit(&self, req: &PassageRequest) -> Result<(), ErrorResponse> {
        let (resource_id, gate) = parse_passage(req)?;
        self.lot.release(gate, resource_id)?.await?;
        Ok(())
    }

    /// Capacity and gate counts.
    #[must_use]
    pub fn info(&self) -> InfoResponse {
        self.lot.info()
    }

    /// Occupied resource ids, sorted for stable output.
    #[must_use]
    pub fn parked(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lot.snapshot().into_iter().collect();
        ids.sort_unstable();
        ids
    }

    /// Whether requests are still being accepted.
    #[must_use]
    pub fn health(&self) -> Health {
        Health {
            ok: !self.lot.is_closed(),
        }
    }
}

fn parse_passage(req: &PassageRequest) -> Result<(&str, usize), ErrorResponse> {
    // The id is an opaque token; only the gate number is normalized.
    let resource_id = req.resource_id.as_str();
    if resource_id.is_empty() {
        return Err(ErrorResponse::bad_request("resourceId is required"));
    }
    let gate = req.gate_id.trim().parse::<usize>().map_err(|_| {
        ErrorResponse::bad_request(format!("gateId `{}` is not a valid gate number", req.gate_id))
    })?;
    Ok((resource_id, gate))
}

fn log_failure<T>(
    call: &str,
    req: &PassageRequest,
    outcome: Result<T, ErrorResponse>,
) -> Result<T, ErrorResponse> {
    if let Err(e) = &outcome {
        warn!(
            call,
            resource_id = %req.resource_id,
            gate_id = %req.gate_id,
            error_code = e.error_code,
            message = %e.message,
            "Unable to fulfill request"
        );
    }
    outcome
}
