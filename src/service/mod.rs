//! Transport-agnostic service surface over the allocator.

pub mod api;

pub use api::{ErrorResponse, Health, InfoResponse, ParkingService, PassageRequest, TicketResponse};
