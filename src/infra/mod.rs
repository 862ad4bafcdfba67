//! Infrastructure: configuration, time source, metrics

pub mod clock;
pub mod config;
pub mod metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use metrics::{Metrics, MetricsSummary};
