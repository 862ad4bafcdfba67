//! Reservation services: the ledger of live claims, the client-facing
//! engine, and the expiry reclaimer.

pub mod engine;
pub mod ledger;
pub mod reclaimer;

pub use engine::{Availability, ReservationEngine};
pub use ledger::{ClaimOutcome, ReservationLedger, TransitionError};
pub use reclaimer::ExpiryReclaimer;
