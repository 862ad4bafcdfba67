//! Integration tests for the full reservation workflow

use boxoffice::domain::{
    HolderId, ReservationError, ReservationStatus, SeatClass, SeatKey, SeatRequest,
};
use boxoffice::infra::{Clock, ManualClock, Metrics};
use boxoffice::io::{InMemoryIdentityProvider, InMemoryShowCatalog};
use boxoffice::services::{ExpiryReclaimer, ReservationEngine, ReservationLedger};
use boxoffice::domain::seat_map::{SeatMap, SeatPricing};
use boxoffice::domain::ShowId;
use chrono::{Duration, Utc};
use std::sync::Arc;

struct Harness {
    catalog: Arc<InMemoryShowCatalog>,
    identity: Arc<InMemoryIdentityProvider>,
    ledger: Arc<ReservationLedger>,
    clock: Arc<ManualClock>,
    metrics: Arc<Metrics>,
    engine: Arc<ReservationEngine>,
    show_id: ShowId,
}

fn harness() -> Harness {
    let catalog = Arc::new(InMemoryShowCatalog::new());
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let ledger = Arc::new(ReservationLedger::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let metrics = Arc::new(Metrics::new());

    let seat_map = SeatMap::grid(8, 10, SeatPricing::default()).unwrap();
    let show_id =
        catalog.add_show("Interstellar", "Screen 1", clock.now() + Duration::hours(8), seat_map);

    let engine = Arc::new(ReservationEngine::new(
        catalog.clone(),
        identity.clone(),
        ledger.clone(),
        clock.clone(),
        metrics.clone(),
        Duration::minutes(15),
    ));

    Harness { catalog, identity, ledger, clock, metrics, engine, show_id }
}

fn reclaimer(h: &Harness) -> ExpiryReclaimer {
    ExpiryReclaimer::new(
        h.ledger.clone(),
        h.catalog.clone(),
        h.clock.clone(),
        h.metrics.clone(),
        std::time::Duration::from_secs(5),
    )
}

fn request(row: &str, number: u32, class: SeatClass) -> SeatRequest {
    SeatRequest { key: SeatKey::new(row, number), class }
}

#[test]
fn test_reserve_finalize_lifecycle() {
    let h = harness();
    let holder = h.identity.register();

    let reservation = h
        .engine
        .reserve(
            h.show_id,
            &[request("A", 1, SeatClass::Regular), request("A", 2, SeatClass::Regular)],
            holder,
        )
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);

    let confirmed = h.engine.finalize(reservation.id).unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    // Confirmed holds survive the deadline
    h.clock.advance(Duration::minutes(30));
    assert_eq!(reclaimer(&h).sweep_once(), 0);
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 78);
}

#[test]
fn test_hold_expires_after_deadline_and_seats_return() {
    let h = harness();
    let holder = h.identity.register();

    let reservation =
        h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder).unwrap();

    // One second before the deadline the hold is still live
    h.clock.advance(Duration::minutes(15) - Duration::seconds(1));
    assert_eq!(reclaimer(&h).sweep_once(), 0);
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 79);

    // At the deadline the sweep reclaims it
    h.clock.advance(Duration::seconds(1));
    assert_eq!(reclaimer(&h).sweep_once(), 1);
    assert_eq!(
        h.engine.get_reservation(reservation.id).unwrap().status,
        ReservationStatus::Expired
    );
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 80);

    // And the seat can be claimed again by someone else
    let other = h.identity.register();
    h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], other).unwrap();
}

#[test]
fn test_finalize_after_expiry_fails() {
    let h = harness();
    let holder = h.identity.register();
    let reservation =
        h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder).unwrap();

    h.clock.advance(Duration::minutes(16));
    reclaimer(&h).sweep_once();

    let err = h.engine.finalize(reservation.id).unwrap_err();
    assert_eq!(
        err,
        ReservationError::InvalidTransition {
            reservation_id: reservation.id,
            actual: ReservationStatus::Expired,
            to: ReservationStatus::Confirmed,
        }
    );
}

#[test]
fn test_cancel_confirmed_returns_seats() {
    let h = harness();
    let holder = h.identity.register();

    let reservation = h
        .engine
        .reserve(
            h.show_id,
            &[request("G", 1, SeatClass::Vip), request("G", 2, SeatClass::Vip)],
            holder,
        )
        .unwrap();
    h.engine.finalize(reservation.id).unwrap();
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 78);

    let cancelled = h.engine.cancel(reservation.id).unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 80);

    let err = h.engine.cancel(reservation.id).unwrap_err();
    assert!(matches!(err, ReservationError::InvalidTransition { .. }));
}

#[test]
fn test_overlapping_requests_exactly_one_winner() {
    let h = harness();

    // 16 threads race for the same two seats; exactly one may win
    let holders: Vec<HolderId> = (0..16).map(|_| h.identity.register()).collect();
    let barrier = Arc::new(std::sync::Barrier::new(holders.len()));

    let handles: Vec<_> = holders
        .into_iter()
        .map(|holder| {
            let engine = h.engine.clone();
            let show_id = h.show_id;
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                engine.reserve(
                    show_id,
                    &[request("C", 5, SeatClass::Regular), request("C", 6, SeatClass::Regular)],
                    holder,
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(e) = result {
            assert!(matches!(e, ReservationError::SeatsAlreadyClaimed { .. }));
        }
    }

    let availability = h.engine.get_availability(h.show_id).unwrap();
    assert_eq!(availability.available, 78);
    assert_eq!(availability.available + availability.claimed_seat_keys.len(), 80);
}

#[test]
fn test_disjoint_requests_all_succeed_concurrently() {
    let h = harness();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = h.engine.clone();
            let show_id = h.show_id;
            let holder = h.identity.register();
            std::thread::spawn(move || {
                engine.reserve(show_id, &[request("B", i + 1, SeatClass::Regular)], holder)
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 72);
}

#[test]
fn test_duplicate_seat_in_one_request_rejected() {
    let h = harness();
    let holder = h.identity.register();

    let err = h
        .engine
        .reserve(
            h.show_id,
            &[request("A", 1, SeatClass::Regular), request("A", 1, SeatClass::Regular)],
            holder,
        )
        .unwrap_err();
    assert_eq!(err, ReservationError::DuplicateSeatRequest { key: SeatKey::new("A", 1) });
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 80);

    // The same seat requested once goes through at its single price
    let reservation =
        h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder).unwrap();
    assert_eq!(reservation.seats.len(), 1);
    assert_eq!(reservation.total_amount, rust_decimal::Decimal::from(200));
}

#[test]
fn test_availability_accounts_for_every_state() {
    let h = harness();
    let holder = h.identity.register();

    h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder).unwrap();
    let confirmed =
        h.engine.reserve(h.show_id, &[request("A", 2, SeatClass::Regular)], holder).unwrap();
    h.engine.finalize(confirmed.id).unwrap();
    let cancelled =
        h.engine.reserve(h.show_id, &[request("A", 3, SeatClass::Regular)], holder).unwrap();
    h.engine.cancel(cancelled.id).unwrap();

    // Pending and confirmed hold seats; cancelled does not
    let availability = h.engine.get_availability(h.show_id).unwrap();
    assert_eq!(availability.available, 78);
    assert!(availability.claimed_seat_keys.contains(&SeatKey::new("A", 1)));
    assert!(availability.claimed_seat_keys.contains(&SeatKey::new("A", 2)));
    assert!(!availability.claimed_seat_keys.contains(&SeatKey::new("A", 3)));
}

#[test]
fn test_deactivated_show_keeps_live_holds() {
    let h = harness();
    let holder = h.identity.register();

    let reservation =
        h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder).unwrap();

    h.catalog.deactivate(h.show_id);

    // No new reservations, but the existing one still finalizes
    let err = h
        .engine
        .reserve(h.show_id, &[request("A", 2, SeatClass::Regular)], holder)
        .unwrap_err();
    assert_eq!(err, ReservationError::ShowNotBookable { show_id: h.show_id });
    assert_eq!(
        h.engine.finalize(reservation.id).unwrap().status,
        ReservationStatus::Confirmed
    );
}

#[test]
fn test_sweep_is_scoped_per_show() {
    let h = harness();
    let holder = h.identity.register();

    let other_map = SeatMap::grid(8, 10, SeatPricing::default()).unwrap();
    let other_show =
        h.catalog.add_show("Dunkirk", "Screen 2", h.clock.now() + Duration::hours(9), other_map);

    h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder).unwrap();
    h.clock.advance(Duration::minutes(10));
    h.engine.reserve(other_show, &[request("A", 1, SeatClass::Regular)], holder).unwrap();

    // Only the first show's hold is past its deadline
    h.clock.advance(Duration::minutes(6));
    assert_eq!(reclaimer(&h).sweep_once(), 1);
    assert_eq!(h.engine.get_availability(h.show_id).unwrap().available, 80);
    assert_eq!(h.engine.get_availability(other_show).unwrap().available, 79);
}

#[test]
fn test_metrics_track_the_workflow() {
    let h = harness();
    let holder = h.identity.register();

    let a = h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder).unwrap();
    h.engine.finalize(a.id).unwrap();

    let conflict = h.engine.reserve(h.show_id, &[request("A", 1, SeatClass::Regular)], holder);
    assert!(conflict.is_err());

    let b = h.engine.reserve(h.show_id, &[request("A", 2, SeatClass::Regular)], holder).unwrap();
    h.clock.advance(Duration::minutes(16));
    reclaimer(&h).sweep_once();
    assert_eq!(
        h.engine.get_reservation(b.id).unwrap().status,
        ReservationStatus::Expired
    );

    let summary = h.metrics.report();
    assert_eq!(summary.reservations_created, 2);
    assert_eq!(summary.reservations_confirmed, 1);
    assert_eq!(summary.claim_conflicts, 1);
    assert_eq!(summary.reservations_expired, 1);
    assert_eq!(summary.sweeps_completed, 1);
    assert_eq!(summary.reserve_attempts, 3);
}
