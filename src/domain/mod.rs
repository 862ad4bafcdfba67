//! Domain models - core business types for seat reservation
//!
//! This module contains the canonical data types used throughout the system:
//! - `Seat` / `SeatMap` - the static per-show seating grid
//! - `Reservation` - a hold on a set of seats, pending until finalized
//! - `ReservationStatus` - the reservation state machine
//! - `ReservationError` - caller-actionable rejection reasons

pub mod error;
pub mod reservation;
pub mod seat_map;
pub mod types;

pub use error::ReservationError;
pub use reservation::{Reservation, ReservationStatus};
pub use seat_map::SeatMap;
pub use types::{HolderId, ReservationId, Seat, SeatClass, SeatKey, SeatRequest, SeatSelection, ShowId};
