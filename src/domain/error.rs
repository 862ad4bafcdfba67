//! Caller-actionable rejection reasons
//!
//! A rejected reservation attempt is an expected outcome under contention,
//! not a fault, so every variant here is a typed result the caller can act
//! on. Infrastructure failures (config, sockets) use `anyhow` instead.

use crate::domain::reservation::ReservationStatus;
use crate::domain::types::{HolderId, ReservationId, SeatClass, SeatKey, ShowId};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReservationError {
    #[error("no seats requested")]
    EmptySeatRequest,

    #[error("show {show_id} not found")]
    ShowNotFound { show_id: ShowId },

    #[error("show {show_id} is not open for booking")]
    ShowNotBookable { show_id: ShowId },

    #[error("unknown holder {holder_id}")]
    UnknownHolder { holder_id: HolderId },

    #[error("seat {key} requested more than once")]
    DuplicateSeatRequest { key: SeatKey },

    #[error("seat {key} not found in seat map")]
    SeatNotFound { key: SeatKey },

    #[error("seat {key} is {actual}, not {requested}")]
    SeatClassMismatch { key: SeatKey, requested: SeatClass, actual: SeatClass },

    /// Lists exactly the requested seats that are already claimed, sorted,
    /// so the caller can retry with a disjoint set.
    #[error("seats already claimed: {}", format_keys(.seats))]
    SeatsAlreadyClaimed { seats: Vec<SeatKey> },

    #[error("reservation {reservation_id} not found")]
    ReservationNotFound { reservation_id: ReservationId },

    #[error("reservation {reservation_id} is {actual}, cannot move to {to}")]
    InvalidTransition {
        reservation_id: ReservationId,
        actual: ReservationStatus,
        to: ReservationStatus,
    },
}

fn format_keys(keys: &[SeatKey]) -> String {
    keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
