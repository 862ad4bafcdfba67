//! Reservation engine - the client-facing seat-booking workflow
//!
//! Validates a request against the show's seat map, prices it from the map
//! (client-supplied prices are never read), and claims the seats through the
//! ledger's atomic primitive. All catalog and identity reads happen before
//! the claim, so nothing blocks inside the per-show critical section.

use crate::domain::error::ReservationError;
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::domain::types::{HolderId, ReservationId, SeatKey, SeatRequest, SeatSelection, ShowId};
use crate::infra::clock::Clock;
use crate::infra::metrics::Metrics;
use crate::io::catalog::ShowCatalog;
use crate::io::identity::IdentityProvider;
use crate::services::ledger::{ClaimOutcome, ReservationLedger, TransitionError};
use chrono::Duration;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Derived availability for one show
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub show_id: ShowId,
    pub total_seats: usize,
    pub available: usize,
    pub claimed_seat_keys: BTreeSet<SeatKey>,
}

pub struct ReservationEngine {
    catalog: Arc<dyn ShowCatalog>,
    identity: Arc<dyn IdentityProvider>,
    ledger: Arc<ReservationLedger>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    hold_ttl: Duration,
}

impl ReservationEngine {
    pub fn new(
        catalog: Arc<dyn ShowCatalog>,
        identity: Arc<dyn IdentityProvider>,
        ledger: Arc<ReservationLedger>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        hold_ttl: Duration,
    ) -> Self {
        Self { catalog, identity, ledger, clock, metrics, hold_ttl }
    }

    pub fn ledger(&self) -> &Arc<ReservationLedger> {
        &self.ledger
    }

    /// Reserve a set of seats, creating a pending hold that must be
    /// finalized before its deadline or it is reclaimed.
    pub fn reserve(
        &self,
        show_id: ShowId,
        requested: &[SeatRequest],
        holder_id: HolderId,
    ) -> Result<Reservation, ReservationError> {
        let start = Instant::now();
        let result = self.reserve_inner(show_id, requested, holder_id);
        self.metrics.record_reserve_latency(start.elapsed().as_micros() as u64);

        match &result {
            Ok(reservation) => {
                self.metrics.record_reservation_created();
                info!(
                    reservation_id = %reservation.id,
                    show_id = %show_id,
                    holder_id = %holder_id,
                    seats = reservation.seats.len(),
                    total_amount = %reservation.total_amount,
                    "reservation_created"
                );
            }
            Err(ReservationError::SeatsAlreadyClaimed { seats }) => {
                self.metrics.record_claim_conflict();
                warn!(
                    show_id = %show_id,
                    holder_id = %holder_id,
                    conflicts = ?seats.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "reservation_conflict"
                );
            }
            Err(reason) => {
                self.metrics.record_rejected_request();
                warn!(show_id = %show_id, holder_id = %holder_id, reason = %reason, "reservation_rejected");
            }
        }
        result
    }

    fn reserve_inner(
        &self,
        show_id: ShowId,
        requested: &[SeatRequest],
        holder_id: HolderId,
    ) -> Result<Reservation, ReservationError> {
        if requested.is_empty() {
            return Err(ReservationError::EmptySeatRequest);
        }

        let show = self
            .catalog
            .get_show(show_id)
            .ok_or(ReservationError::ShowNotFound { show_id })?;

        let now = self.clock.now();
        if !show.is_bookable(now) {
            return Err(ReservationError::ShowNotBookable { show_id });
        }

        if !self.identity.resolve_holder(holder_id) {
            return Err(ReservationError::UnknownHolder { holder_id });
        }

        // Resolve every requested seat against the map before claiming
        // anything; the declared class is checked, the map's price is taken.
        // The request itself must be a set: a repeated key would double-charge.
        let mut selections: SmallVec<[SeatSelection; 4]> = SmallVec::with_capacity(requested.len());
        for (i, request) in requested.iter().enumerate() {
            if requested[..i].iter().any(|r| r.key == request.key) {
                return Err(ReservationError::DuplicateSeatRequest { key: request.key.clone() });
            }
            let seat = show
                .seat_map
                .lookup(&request.key)
                .ok_or_else(|| ReservationError::SeatNotFound { key: request.key.clone() })?;
            if seat.class != request.class {
                return Err(ReservationError::SeatClassMismatch {
                    key: request.key.clone(),
                    requested: request.class,
                    actual: seat.class,
                });
            }
            selections.push(SeatSelection::from_seat(seat));
        }

        match self.ledger.try_claim(show_id, selections, holder_id, now, self.hold_ttl) {
            ClaimOutcome::Claimed(reservation) => Ok(reservation),
            ClaimOutcome::Conflict(seats) => Err(ReservationError::SeatsAlreadyClaimed { seats }),
        }
    }

    /// Confirm a pending reservation. Fails if the expiry sweep (or a
    /// cancel) got there first.
    pub fn finalize(&self, reservation_id: ReservationId) -> Result<Reservation, ReservationError> {
        match self.ledger.transition(
            reservation_id,
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
        ) {
            Ok(reservation) => {
                self.metrics.record_reservation_confirmed();
                info!(reservation_id = %reservation_id, "reservation_finalized");
                Ok(reservation)
            }
            Err(e) => Err(Self::map_transition_error(reservation_id, e, ReservationStatus::Confirmed)),
        }
    }

    /// Cancel a live reservation, freeing its seats
    pub fn cancel(&self, reservation_id: ReservationId) -> Result<Reservation, ReservationError> {
        match self.ledger.cancel(reservation_id) {
            Ok(reservation) => {
                self.metrics.record_reservation_cancelled();
                Ok(reservation)
            }
            Err(e) => Err(Self::map_transition_error(reservation_id, e, ReservationStatus::Cancelled)),
        }
    }

    /// Snapshot a reservation by id
    pub fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Reservation, ReservationError> {
        self.ledger
            .get(reservation_id)
            .ok_or(ReservationError::ReservationNotFound { reservation_id })
    }

    /// Derived availability: total minus the live claim set. Computed from
    /// the ledger's claim index, so it is never stale relative to an
    /// accepted claim.
    pub fn get_availability(&self, show_id: ShowId) -> Result<Availability, ReservationError> {
        let show = self
            .catalog
            .get_show(show_id)
            .ok_or(ReservationError::ShowNotFound { show_id })?;

        let claimed = self.ledger.claimed_seats(show_id);
        let total_seats = show.seat_map.total_seats();
        Ok(Availability {
            show_id,
            total_seats,
            available: total_seats - claimed.len(),
            claimed_seat_keys: claimed,
        })
    }

    fn map_transition_error(
        reservation_id: ReservationId,
        error: TransitionError,
        to: ReservationStatus,
    ) -> ReservationError {
        match error {
            TransitionError::NotFound => ReservationError::ReservationNotFound { reservation_id },
            TransitionError::Invalid { actual } => {
                ReservationError::InvalidTransition { reservation_id, actual, to }
            }
        }
    }
}
