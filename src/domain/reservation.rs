//! Reservation record and its state machine
//!
//! A reservation starts `pending` and reaches exactly one terminal state:
//! `confirmed` via an explicit finalize, `expired` via the reclaimer once the
//! hold deadline passes, or `cancelled` via an explicit cancel. Terminal
//! states never revert.

use crate::domain::types::{HolderId, ReservationId, SeatKey, SeatSelection, ShowId};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Expired => "expired",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Once a reservation leaves pending it never moves again
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }

    /// Live reservations hold their seat claims
    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// The legality table for the state machine; any edge not listed here is
    /// an invalid transition.
    pub fn can_transition_to(&self, to: ReservationStatus) -> bool {
        use ReservationStatus::{Cancelled, Confirmed, Expired, Pending};
        matches!(
            (*self, to),
            (Pending, Confirmed) | (Pending, Expired) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hold on a non-empty set of seats for one show
///
/// Owned exclusively by the ledger that created it; callers reference it by
/// id only. Seat class and price are captured at claim time so a later map
/// change can never alter what the holder was quoted.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub show_id: ShowId,
    pub holder_id: HolderId,
    pub seats: SmallVec<[SeatSelection; 4]>,
    pub total_amount: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Reservation {
    /// Create a new pending reservation with a fixed, non-extendable deadline
    pub fn new_pending(
        show_id: ShowId,
        holder_id: HolderId,
        seats: SmallVec<[SeatSelection; 4]>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        debug_assert!(!seats.is_empty());
        let total_amount = seats.iter().map(|s| s.price).sum();
        Self {
            id: ReservationId::new(),
            show_id,
            holder_id,
            seats,
            total_amount,
            status: ReservationStatus::Pending,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn seat_keys(&self) -> impl Iterator<Item = &SeatKey> {
        self.seats.iter().map(|s| &s.key)
    }

    /// Whether the hold deadline has passed at the given instant
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Pending && self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Seat, SeatClass};
    use smallvec::smallvec;

    fn selection(row: &str, number: u32, price: u32) -> SeatSelection {
        SeatSelection::from_seat(&Seat {
            row: row.to_string(),
            number,
            class: SeatClass::Regular,
            price: Decimal::from(price),
        })
    }

    #[test]
    fn test_legal_transitions() {
        use ReservationStatus::{Cancelled, Confirmed, Expired, Pending};

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Expired));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_never_revert() {
        use ReservationStatus::{Cancelled, Confirmed, Expired, Pending};

        for terminal in [Confirmed, Expired, Cancelled] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Pending));
            assert!(!terminal.can_transition_to(Expired));
            assert!(!terminal.can_transition_to(Confirmed));
        }
        assert!(!Expired.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_live_statuses() {
        assert!(ReservationStatus::Pending.is_live());
        assert!(ReservationStatus::Confirmed.is_live());
        assert!(!ReservationStatus::Expired.is_live());
        assert!(!ReservationStatus::Cancelled.is_live());
    }

    #[test]
    fn test_new_pending_totals_and_deadline() {
        let now = Utc::now();
        let reservation = Reservation::new_pending(
            ShowId::new(),
            HolderId::new(),
            smallvec![selection("A", 1, 200), selection("A", 2, 300)],
            now,
            Duration::minutes(15),
        );

        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.total_amount, Decimal::from(500));
        assert_eq!(reservation.created_at, now);
        assert_eq!(reservation.expires_at, now + Duration::minutes(15));
        assert!(!reservation.is_overdue(now));
        assert!(reservation.is_overdue(now + Duration::minutes(15)));
        assert!(reservation.is_overdue(now + Duration::minutes(16)));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ReservationStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }

    #[test]
    fn test_reservation_serializes_status_and_deadline() {
        let reservation = Reservation::new_pending(
            ShowId::new(),
            HolderId::new(),
            smallvec![selection("A", 1, 200)],
            Utc::now(),
            Duration::minutes(15),
        );
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&reservation).unwrap()).unwrap();

        assert_eq!(value["status"], "pending");
        assert!(value["expires_at"].is_string());
        assert_eq!(value["seats"][0]["key"]["row"], "A");
        assert_eq!(value["seats"][0]["key"]["number"], 1);
    }
}
