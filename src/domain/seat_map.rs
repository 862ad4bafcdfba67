//! Static per-show seating grid
//!
//! Built once when a show is scheduled and never mutated afterwards;
//! rescheduling replaces the whole show, not the map.

use crate::domain::types::{Seat, SeatClass, SeatKey};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

/// Row labels used by the grid builder, front to back
const ROW_LABELS: [&str; 10] = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeatMapError {
    #[error("duplicate seat {0} in seat map")]
    DuplicateSeat(SeatKey),
    #[error("seat map has no seats")]
    Empty,
    #[error("grid supports at most {max} rows, got {requested}")]
    TooManyRows { requested: usize, max: usize },
}

/// Per-class pricing for the grid builder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeatPricing {
    pub regular: Decimal,
    pub premium: Decimal,
    pub vip: Decimal,
}

impl SeatPricing {
    pub fn price_of(&self, class: SeatClass) -> Decimal {
        match class {
            SeatClass::Regular => self.regular,
            SeatClass::Premium => self.premium,
            SeatClass::Vip => self.vip,
        }
    }
}

impl Default for SeatPricing {
    fn default() -> Self {
        Self {
            regular: Decimal::from(200),
            premium: Decimal::from(300),
            vip: Decimal::from(500),
        }
    }
}

/// Ordered seating grid with keyed lookup
///
/// Invariant: no two seats share a (row, number) key.
#[derive(Debug, Clone, Serialize)]
pub struct SeatMap {
    rows: Vec<Vec<Seat>>,
    #[serde(skip)]
    index: FxHashMap<SeatKey, (usize, usize)>,
    total_seats: usize,
}

impl SeatMap {
    /// Build a seat map from ordered rows, rejecting duplicate seat keys
    pub fn new(rows: Vec<Vec<Seat>>) -> Result<Self, SeatMapError> {
        let mut index = FxHashMap::default();
        let mut total_seats = 0usize;

        for (ri, row) in rows.iter().enumerate() {
            for (si, seat) in row.iter().enumerate() {
                let key = seat.key();
                if index.insert(key.clone(), (ri, si)).is_some() {
                    return Err(SeatMapError::DuplicateSeat(key));
                }
                total_seats += 1;
            }
        }

        if total_seats == 0 {
            return Err(SeatMapError::Empty);
        }

        Ok(Self { rows, index, total_seats })
    }

    /// Build a rectangular grid with class tiers: the back two rows are VIP,
    /// the two before those premium, the rest regular.
    pub fn grid(
        row_count: usize,
        seats_per_row: u32,
        pricing: SeatPricing,
    ) -> Result<Self, SeatMapError> {
        if row_count > ROW_LABELS.len() {
            return Err(SeatMapError::TooManyRows { requested: row_count, max: ROW_LABELS.len() });
        }

        let mut rows = Vec::with_capacity(row_count);
        for (i, label) in ROW_LABELS.iter().take(row_count).enumerate() {
            let class = if i + 2 >= row_count {
                SeatClass::Vip
            } else if i + 4 >= row_count {
                SeatClass::Premium
            } else {
                SeatClass::Regular
            };

            let row: Vec<Seat> = (1..=seats_per_row)
                .map(|number| Seat {
                    row: (*label).to_string(),
                    number,
                    class,
                    price: pricing.price_of(class),
                })
                .collect();
            rows.push(row);
        }

        Self::new(rows)
    }

    /// Authoritative seat lookup; the source of truth for class and price
    pub fn lookup(&self, key: &SeatKey) -> Option<&Seat> {
        self.index.get(key).map(|&(ri, si)| &self.rows[ri][si])
    }

    pub fn total_seats(&self) -> usize {
        self.total_seats
    }

    pub fn rows(&self) -> &[Vec<Seat>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(row: &str, number: u32, class: SeatClass, price: u32) -> Seat {
        Seat { row: row.to_string(), number, class, price: Decimal::from(price) }
    }

    #[test]
    fn test_lookup() {
        let map = SeatMap::new(vec![
            vec![seat("A", 1, SeatClass::Regular, 200), seat("A", 2, SeatClass::Regular, 200)],
            vec![seat("B", 1, SeatClass::Vip, 500)],
        ])
        .unwrap();

        assert_eq!(map.total_seats(), 3);
        let found = map.lookup(&SeatKey::new("B", 1)).unwrap();
        assert_eq!(found.class, SeatClass::Vip);
        assert_eq!(found.price, Decimal::from(500));
        assert!(map.lookup(&SeatKey::new("C", 1)).is_none());
        assert!(map.lookup(&SeatKey::new("A", 3)).is_none());
    }

    #[test]
    fn test_duplicate_seat_rejected() {
        let result = SeatMap::new(vec![vec![
            seat("A", 1, SeatClass::Regular, 200),
            seat("A", 1, SeatClass::Premium, 300),
        ]]);
        assert_eq!(result.unwrap_err(), SeatMapError::DuplicateSeat(SeatKey::new("A", 1)));
    }

    #[test]
    fn test_empty_map_rejected() {
        assert_eq!(SeatMap::new(vec![]).unwrap_err(), SeatMapError::Empty);
        assert_eq!(SeatMap::new(vec![vec![], vec![]]).unwrap_err(), SeatMapError::Empty);
    }

    #[test]
    fn test_grid_tiers() {
        let map = SeatMap::grid(6, 4, SeatPricing::default()).unwrap();
        assert_eq!(map.total_seats(), 24);

        // Rows A..D regular/premium split, E..F vip
        assert_eq!(map.lookup(&SeatKey::new("A", 1)).unwrap().class, SeatClass::Regular);
        assert_eq!(map.lookup(&SeatKey::new("B", 4)).unwrap().class, SeatClass::Regular);
        assert_eq!(map.lookup(&SeatKey::new("C", 2)).unwrap().class, SeatClass::Premium);
        assert_eq!(map.lookup(&SeatKey::new("D", 3)).unwrap().class, SeatClass::Premium);
        assert_eq!(map.lookup(&SeatKey::new("E", 1)).unwrap().class, SeatClass::Vip);
        assert_eq!(map.lookup(&SeatKey::new("F", 4)).unwrap().class, SeatClass::Vip);
    }

    #[test]
    fn test_grid_prices_follow_class() {
        let pricing = SeatPricing {
            regular: Decimal::from(150),
            premium: Decimal::from(250),
            vip: Decimal::from(400),
        };
        let map = SeatMap::grid(5, 2, pricing).unwrap();

        assert_eq!(map.lookup(&SeatKey::new("A", 1)).unwrap().price, Decimal::from(150));
        assert_eq!(map.lookup(&SeatKey::new("B", 1)).unwrap().price, Decimal::from(250));
        assert_eq!(map.lookup(&SeatKey::new("E", 2)).unwrap().price, Decimal::from(400));
    }

    #[test]
    fn test_grid_too_many_rows() {
        let result = SeatMap::grid(11, 4, SeatPricing::default());
        assert!(matches!(result, Err(SeatMapError::TooManyRows { requested: 11, .. })));
    }
}
