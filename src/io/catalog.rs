//! Show catalog - the external source of truth for scheduled shows
//!
//! The core only reads from this seam: a show's seat map is fixed at
//! creation and never changes afterwards (rescheduling replaces the show).
//! The in-memory implementation backs the binary and the tests; a real
//! deployment would put the movie database behind the same trait.

use crate::domain::seat_map::{SeatMap, SeatMapError, SeatPricing};
use crate::domain::types::ShowId;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// A scheduled show as the core sees it
#[derive(Debug, Serialize)]
pub struct Show {
    pub id: ShowId,
    pub movie: String,
    pub screen: String,
    pub show_time: DateTime<Utc>,
    pub is_active: bool,
    pub seat_map: SeatMap,
}

impl Show {
    /// Whether reservations may be taken at the given instant
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.show_time > now
    }
}

/// Read-only catalog contract consumed by the reservation engine
pub trait ShowCatalog: Send + Sync {
    fn get_show(&self, show_id: ShowId) -> Option<Arc<Show>>;
    fn list_shows(&self) -> Vec<Arc<Show>>;
}

/// In-memory show catalog
pub struct InMemoryShowCatalog {
    shows: RwLock<FxHashMap<ShowId, Arc<Show>>>,
}

impl InMemoryShowCatalog {
    pub fn new() -> Self {
        Self { shows: RwLock::new(FxHashMap::default()) }
    }

    /// Schedule a show; the seat map is frozen from here on
    pub fn add_show(
        &self,
        movie: impl Into<String>,
        screen: impl Into<String>,
        show_time: DateTime<Utc>,
        seat_map: SeatMap,
    ) -> ShowId {
        let show = Show {
            id: ShowId::new(),
            movie: movie.into(),
            screen: screen.into(),
            show_time,
            is_active: true,
            seat_map,
        };
        let id = show.id;
        self.shows.write().insert(id, Arc::new(show));
        id
    }

    /// Deactivate a show; live reservations are untouched but no new ones
    /// may be taken.
    pub fn deactivate(&self, show_id: ShowId) -> bool {
        let mut shows = self.shows.write();
        match shows.get(&show_id) {
            Some(existing) => {
                let show = Show {
                    id: existing.id,
                    movie: existing.movie.clone(),
                    screen: existing.screen.clone(),
                    show_time: existing.show_time,
                    is_active: false,
                    seat_map: existing.seat_map.clone(),
                };
                shows.insert(show_id, Arc::new(show));
                true
            }
            None => false,
        }
    }

    /// Seed a demo catalog: `count` shows on consecutive evenings, one
    /// auditorium geometry, tiered prices.
    pub fn seed_demo(
        &self,
        count: usize,
        rows: usize,
        seats_per_row: u32,
        pricing: SeatPricing,
        now: DateTime<Utc>,
    ) -> Result<Vec<ShowId>, SeatMapError> {
        const MOVIES: [&str; 4] =
            ["The Dark Knight", "Inception", "Interstellar", "Dunkirk"];

        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let seat_map = SeatMap::grid(rows, seats_per_row, pricing)?;
            let movie = MOVIES[i % MOVIES.len()];
            let show_time = now + Duration::hours(6 + 24 * i as i64);
            let id = self.add_show(movie, format!("Screen {}", i % 2 + 1), show_time, seat_map);
            info!(show_id = %id, movie = %movie, show_time = %show_time, "demo_show_seeded");
            ids.push(id);
        }
        Ok(ids)
    }
}

impl Default for InMemoryShowCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ShowCatalog for InMemoryShowCatalog {
    fn get_show(&self, show_id: ShowId) -> Option<Arc<Show>> {
        self.shows.read().get(&show_id).cloned()
    }

    fn list_shows(&self) -> Vec<Arc<Show>> {
        let mut shows: Vec<Arc<Show>> = self.shows.read().values().cloned().collect();
        shows.sort_by_key(|s| (s.show_time, s.id));
        shows
    }
}
