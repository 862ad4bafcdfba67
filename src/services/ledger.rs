//! Reservation ledger - the authoritative set of live seat claims per show
//!
//! All mutation goes through `try_claim`, `transition`, `cancel`, and
//! `release_expired`, each of which holds exactly one show's shard lock for
//! the duration of its check-and-write. Different shows never contend.
//! Nothing here blocks on I/O while a shard lock is held.

use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::domain::types::{HolderId, ReservationId, SeatKey, SeatSelection, ShowId};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-show reservation state, guarded by one mutex
#[derive(Default)]
struct ShowShard {
    /// All reservations ever created for this show, terminal ones included
    reservations: FxHashMap<ReservationId, Reservation>,
    /// Seat keys claimed by live (pending or confirmed) reservations
    claimed: FxHashMap<SeatKey, ReservationId>,
}

impl ShowShard {
    /// Apply a status change and maintain the claimed-seat index.
    /// Caller has already checked legality; the reservation must exist.
    fn apply_transition(&mut self, id: ReservationId, to: ReservationStatus) -> Reservation {
        let reservation = self.reservations.get_mut(&id).expect("checked by caller");
        reservation.status = to;
        let snapshot = reservation.clone();

        if !to.is_live() {
            for key in snapshot.seat_keys() {
                self.claimed.remove(key);
            }
        }
        snapshot
    }
}

/// Authoritative ledger of live reservations, sharded by show
pub struct ReservationLedger {
    shards: RwLock<FxHashMap<ShowId, Arc<Mutex<ShowShard>>>>,
    /// Locates a reservation's shard for transition/cancel calls
    index: RwLock<FxHashMap<ReservationId, ShowId>>,
}

/// Outcome of an atomic claim attempt
pub enum ClaimOutcome {
    Claimed(Reservation),
    /// Exactly the requested seats that are already held, sorted
    Conflict(Vec<SeatKey>),
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self { shards: RwLock::new(FxHashMap::default()), index: RwLock::new(FxHashMap::default()) }
    }

    fn shard(&self, show_id: ShowId) -> Arc<Mutex<ShowShard>> {
        if let Some(shard) = self.shards.read().get(&show_id) {
            return shard.clone();
        }
        self.shards.write().entry(show_id).or_default().clone()
    }

    /// Seat keys currently claimed by live reservations for a show
    pub fn claimed_seats(&self, show_id: ShowId) -> BTreeSet<SeatKey> {
        let shard = self.shard(show_id);
        let shard = shard.lock();
        shard.claimed.keys().cloned().collect()
    }

    /// The atomic check-and-claim primitive.
    ///
    /// Checks every requested key against the live claim set and inserts a
    /// new pending reservation in the same critical section. There is no
    /// window in which two overlapping requests can both pass the check.
    pub fn try_claim(
        &self,
        show_id: ShowId,
        seats: SmallVec<[SeatSelection; 4]>,
        holder_id: HolderId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> ClaimOutcome {
        debug_assert!(!seats.is_empty());

        let shard = self.shard(show_id);
        let mut shard = shard.lock();

        let mut conflicts: Vec<SeatKey> = seats
            .iter()
            .filter(|s| shard.claimed.contains_key(&s.key))
            .map(|s| s.key.clone())
            .collect();
        if !conflicts.is_empty() {
            conflicts.sort();
            conflicts.dedup();
            debug!(
                show_id = %show_id,
                holder_id = %holder_id,
                conflicts = ?conflicts.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "claim_conflict"
            );
            return ClaimOutcome::Conflict(conflicts);
        }

        let reservation = Reservation::new_pending(show_id, holder_id, seats, now, ttl);
        for key in reservation.seat_keys() {
            shard.claimed.insert(key.clone(), reservation.id);
        }
        shard.reservations.insert(reservation.id, reservation.clone());
        drop(shard);

        self.index.write().insert(reservation.id, show_id);

        info!(
            reservation_id = %reservation.id,
            show_id = %show_id,
            holder_id = %holder_id,
            seats = reservation.seats.len(),
            expires_at = %reservation.expires_at,
            "reservation_claimed"
        );
        ClaimOutcome::Claimed(reservation)
    }

    /// Compare-and-transition: succeeds only if the reservation's current
    /// status equals `from` and the edge is legal. Concurrent transitions on
    /// the same reservation serialize on the shard lock, so exactly one of a
    /// racing confirm/expire pair wins and the loser mutates nothing.
    pub fn transition(
        &self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Reservation, TransitionError> {
        let show_id = self.show_of(id).ok_or(TransitionError::NotFound)?;
        let shard = self.shard(show_id);
        let mut shard = shard.lock();

        let current = shard.reservations.get(&id).ok_or(TransitionError::NotFound)?.status;
        if current != from || !from.can_transition_to(to) {
            return Err(TransitionError::Invalid { actual: current });
        }

        let snapshot = shard.apply_transition(id, to);
        debug!(reservation_id = %id, from = %from, to = %to, "reservation_transition");
        Ok(snapshot)
    }

    /// The cancel form of the transition primitive: pending or confirmed to
    /// cancelled in one atomic step, freeing the seats. Safe to race against
    /// expiry and finalize; whichever lands first wins.
    pub fn cancel(&self, id: ReservationId) -> Result<Reservation, TransitionError> {
        let show_id = self.show_of(id).ok_or(TransitionError::NotFound)?;
        let shard = self.shard(show_id);
        let mut shard = shard.lock();

        let current = shard.reservations.get(&id).ok_or(TransitionError::NotFound)?.status;
        if !current.can_transition_to(ReservationStatus::Cancelled) {
            return Err(TransitionError::Invalid { actual: current });
        }

        let snapshot = shard.apply_transition(id, ReservationStatus::Cancelled);
        info!(reservation_id = %id, from = %current, "reservation_cancelled");
        Ok(snapshot)
    }

    /// Transition every overdue pending reservation for a show to expired,
    /// freeing its seats. Each release is a pending->expired transition, so
    /// re-sweeping is a no-op and racing a concurrent finalize is safe.
    pub fn release_expired(&self, show_id: ShowId, now: DateTime<Utc>) -> Vec<ReservationId> {
        let shard = self.shard(show_id);
        let mut shard = shard.lock();

        let overdue: Vec<ReservationId> = shard
            .reservations
            .values()
            .filter(|r| r.is_overdue(now))
            .map(|r| r.id)
            .collect();

        for &id in &overdue {
            shard.apply_transition(id, ReservationStatus::Expired);
            info!(reservation_id = %id, show_id = %show_id, "reservation_expired");
        }
        overdue
    }

    /// Every show that currently has a shard, pending or not
    pub fn show_ids(&self) -> Vec<ShowId> {
        self.shards.read().keys().copied().collect()
    }

    /// Drop a show's shard and all its reservation records, keeping memory
    /// bounded for long-running instances. Refuses while any pending hold
    /// remains so the expiry path always settles a hold before it is
    /// discarded; confirmed and terminal records go with the shard. Intended
    /// for shows past their show time, where no new claims can arrive.
    pub fn prune_show(&self, show_id: ShowId) -> Option<usize> {
        let mut shards = self.shards.write();
        let shard_arc = shards.get(&show_id)?.clone();
        let ids: Vec<ReservationId> = {
            let shard = shard_arc.lock();
            if shard.reservations.values().any(|r| r.status == ReservationStatus::Pending) {
                return None;
            }
            shard.reservations.keys().copied().collect()
        };
        shards.remove(&show_id);
        drop(shards);

        let mut index = self.index.write();
        for id in &ids {
            index.remove(id);
        }
        drop(index);

        info!(show_id = %show_id, reservations = ids.len(), "show_shard_pruned");
        Some(ids.len())
    }

    /// Shows that currently have pending reservations; the sweep visits these
    pub fn shows_with_pending(&self) -> Vec<ShowId> {
        let shards: Vec<(ShowId, Arc<Mutex<ShowShard>>)> =
            self.shards.read().iter().map(|(k, v)| (*k, v.clone())).collect();

        shards
            .into_iter()
            .filter(|(_, shard)| {
                shard.lock().reservations.values().any(|r| r.status == ReservationStatus::Pending)
            })
            .map(|(show_id, _)| show_id)
            .collect()
    }

    /// Snapshot of a reservation by id
    pub fn get(&self, id: ReservationId) -> Option<Reservation> {
        let show_id = self.show_of(id)?;
        let shard = self.shard(show_id);
        let shard = shard.lock();
        shard.reservations.get(&id).cloned()
    }

    fn show_of(&self, id: ReservationId) -> Option<ShowId> {
        self.index.read().get(&id).copied()
    }
}

impl Default for ReservationLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal transition failure, mapped to the public taxonomy by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    NotFound,
    Invalid { actual: ReservationStatus },
}
