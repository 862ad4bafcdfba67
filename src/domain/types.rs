//! Shared types for the seat reservation core

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
fn new_uuid_v7() -> Uuid {
    Uuid::now_v7()
}

/// Newtype wrapper for show IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ShowId(pub Uuid);

impl ShowId {
    pub fn new() -> Self {
        Self(new_uuid_v7())
    }
}

impl Default for ShowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShowId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Newtype wrapper for reservation IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ReservationId(pub Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(new_uuid_v7())
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReservationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Newtype wrapper for holder (customer) IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct HolderId(pub Uuid);

impl HolderId {
    pub fn new() -> Self {
        Self(new_uuid_v7())
    }
}

impl Default for HolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for HolderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Seat class within an auditorium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatClass {
    Regular,
    Premium,
    Vip,
}

impl SeatClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::Regular => "regular",
            SeatClass::Premium => "premium",
            SeatClass::Vip => "vip",
        }
    }
}

impl std::fmt::Display for SeatClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a seat within one show's seat map
///
/// Ordering is row-major so conflict reports and claimed-seat listings come
/// out deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatKey {
    pub row: String,
    pub number: u32,
}

impl SeatKey {
    pub fn new(row: impl Into<String>, number: u32) -> Self {
        Self { row: row.into(), number }
    }
}

impl std::fmt::Display for SeatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

/// Immutable seat descriptor in a show's seat map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub row: String,
    pub number: u32,
    pub class: SeatClass,
    pub price: Decimal,
}

impl Seat {
    pub fn key(&self) -> SeatKey {
        SeatKey { row: self.row.clone(), number: self.number }
    }
}

/// A seat as requested by a client
///
/// The declared class is advisory only; the seat map's recorded class is
/// authoritative and a mismatch rejects the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRequest {
    pub key: SeatKey,
    pub class: SeatClass,
}

/// A seat captured on a reservation: class and price as they were in the seat
/// map at claim time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSelection {
    pub key: SeatKey,
    pub class: SeatClass,
    pub price: Decimal,
}

impl SeatSelection {
    pub fn from_seat(seat: &Seat) -> Self {
        Self { key: seat.key(), class: seat.class, price: seat.price }
    }
}
