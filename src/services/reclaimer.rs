//! Expiry reclaimer - sweeps overdue pending holds back into inventory
//!
//! A periodic sweep is the only expiry mechanism: read paths never mutate on
//! their way through, so a seat held past its deadline stays visibly claimed
//! until the next sweep frees it. The sweep interval bounds that staleness.

use crate::infra::clock::Clock;
use crate::infra::metrics::Metrics;
use crate::io::catalog::ShowCatalog;
use crate::services::ledger::ReservationLedger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

pub struct ExpiryReclaimer {
    ledger: Arc<ReservationLedger>,
    catalog: Arc<dyn ShowCatalog>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    sweep_interval: Duration,
}

impl ExpiryReclaimer {
    pub fn new(
        ledger: Arc<ReservationLedger>,
        catalog: Arc<dyn ShowCatalog>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        sweep_interval: Duration,
    ) -> Self {
        Self { ledger, catalog, clock, metrics, sweep_interval }
    }

    /// One full pass over every show with pending holds. Returns the number
    /// of reservations expired. Each show is swept under its own lock, so a
    /// pass never stalls the whole ledger. After the expiry pass, shards for
    /// shows already past their show time are pruned once every hold has
    /// settled, keeping the ledger bounded.
    pub fn sweep_once(&self) -> usize {
        let now = self.clock.now();
        let mut expired = 0usize;

        for show_id in self.ledger.shows_with_pending() {
            expired += self.ledger.release_expired(show_id, now).len();
        }

        for show_id in self.ledger.show_ids() {
            if let Some(show) = self.catalog.get_show(show_id) {
                if show.show_time <= now {
                    self.ledger.prune_show(show_id);
                }
            }
        }

        self.metrics.record_sweep();
        if expired > 0 {
            self.metrics.record_reservations_expired(expired as u64);
            info!(expired = expired, "expiry_sweep_completed");
        } else {
            debug!("expiry_sweep_completed");
        }
        expired
    }

    /// Sweep on the configured interval until shutdown is signalled
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_secs = self.sweep_interval.as_secs(), "reclaimer_started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("reclaimer_stopped");
                        break;
                    }
                }
            }
        }
    }
}
