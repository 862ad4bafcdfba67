//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::seat_map::SeatPricing;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceConfig {
    /// Unique service instance identifier (e.g., "boxoffice-dev")
    #[serde(default = "default_service_id")]
    pub id: String,
}

fn default_service_id() -> String {
    "boxoffice".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoldConfig {
    /// Seconds a pending reservation holds its seats before reclamation
    #[serde(default = "default_hold_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_hold_ttl_secs() -> u64 {
    900
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self { ttl_secs: default_hold_ttl_secs() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReclaimerConfig {
    /// Seconds between expiry sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    5
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self { sweep_interval_secs: default_sweep_interval_secs() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
    /// Metrics/API HTTP port (0 to disable)
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_metrics_interval_secs() -> u64 {
    10
}

fn default_http_port() -> u16 {
    8080
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs(), http_port: default_http_port() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditoriumConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_seats_per_row")]
    pub seats_per_row: u32,
    #[serde(default = "default_regular_price")]
    pub regular_price: Decimal,
    #[serde(default = "default_premium_price")]
    pub premium_price: Decimal,
    #[serde(default = "default_vip_price")]
    pub vip_price: Decimal,
}

fn default_rows() -> usize {
    8
}

fn default_seats_per_row() -> u32 {
    10
}

fn default_regular_price() -> Decimal {
    Decimal::from(200)
}

fn default_premium_price() -> Decimal {
    Decimal::from(300)
}

fn default_vip_price() -> Decimal {
    Decimal::from(500)
}

impl Default for AuditoriumConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            seats_per_row: default_seats_per_row(),
            regular_price: default_regular_price(),
            premium_price: default_premium_price(),
            vip_price: default_vip_price(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Number of demo shows to seed at startup (0 to start empty)
    #[serde(default = "default_demo_shows")]
    pub demo_shows: usize,
}

fn default_demo_shows() -> usize {
    4
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { demo_shows: default_demo_shows() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub hold: HoldConfig,
    #[serde(default)]
    pub reclaimer: ReclaimerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub auditorium: AuditoriumConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    service_id: String,
    hold_ttl_secs: u64,
    sweep_interval_secs: u64,
    metrics_interval_secs: u64,
    http_port: u16,
    auditorium_rows: usize,
    seats_per_row: u32,
    regular_price: Decimal,
    premium_price: Decimal,
    vip_price: Decimal,
    demo_shows: usize,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_id: default_service_id(),
            hold_ttl_secs: default_hold_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            metrics_interval_secs: default_metrics_interval_secs(),
            http_port: default_http_port(),
            auditorium_rows: default_rows(),
            seats_per_row: default_seats_per_row(),
            regular_price: default_regular_price(),
            premium_price: default_premium_price(),
            vip_price: default_vip_price(),
            demo_shows: default_demo_shows(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from the CLI value or environment
    pub fn resolve_path(cli: Option<&str>) -> String {
        if let Some(path) = cli {
            return path.to_string();
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        // Default to dev.toml
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            service_id: toml_config.service.id,
            hold_ttl_secs: toml_config.hold.ttl_secs,
            sweep_interval_secs: toml_config.reclaimer.sweep_interval_secs,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            http_port: toml_config.metrics.http_port,
            auditorium_rows: toml_config.auditorium.rows,
            seats_per_row: toml_config.auditorium.seats_per_row,
            regular_price: toml_config.auditorium.regular_price,
            premium_price: toml_config.auditorium.premium_price,
            vip_price: toml_config.auditorium.vip_price,
            demo_shows: toml_config.catalog.demo_shows,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration from a known path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn seat_pricing(&self) -> SeatPricing {
        SeatPricing {
            regular: self.regular_price,
            premium: self.premium_price,
            vip: self.vip_price,
        }
    }

    pub fn hold_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.hold_ttl_secs as i64)
    }

    // Getters for all config fields
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn hold_ttl_secs(&self) -> u64 {
        self.hold_ttl_secs
    }

    pub fn sweep_interval_secs(&self) -> u64 {
        self.sweep_interval_secs
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn auditorium_rows(&self) -> usize {
        self.auditorium_rows
    }

    pub fn seats_per_row(&self) -> u32 {
        self.seats_per_row
    }

    pub fn demo_shows(&self) -> usize {
        self.demo_shows
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the hold TTL
    #[cfg(test)]
    pub fn with_hold_ttl_secs(mut self, secs: u64) -> Self {
        self.hold_ttl_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_id(), "boxoffice");
        assert_eq!(config.hold_ttl_secs(), 900);
        assert_eq!(config.sweep_interval_secs(), 5);
        assert_eq!(config.metrics_interval_secs(), 10);
        assert_eq!(config.http_port(), 8080);
        assert_eq!(config.auditorium_rows(), 8);
        assert_eq!(config.seats_per_row(), 10);
        assert_eq!(config.demo_shows(), 4);
    }

    #[test]
    fn test_default_pricing() {
        let pricing = Config::default().seat_pricing();
        assert_eq!(pricing.regular, Decimal::from(200));
        assert_eq!(pricing.premium, Decimal::from(300));
        assert_eq!(pricing.vip, Decimal::from(500));
    }

    #[test]
    fn test_hold_ttl_duration() {
        let config = Config::default().with_hold_ttl_secs(60);
        assert_eq!(config.hold_ttl(), chrono::Duration::minutes(1));
    }

    #[test]
    fn test_resolve_path_cli_wins() {
        assert_eq!(Config::resolve_path(Some("config/prod.toml")), "config/prod.toml");
    }

    #[test]
    fn test_resolve_path_default() {
        if env::var("CONFIG_FILE").is_err() {
            assert_eq!(Config::resolve_path(None), "config/dev.toml");
        }
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let toml_config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(toml_config.hold.ttl_secs, 900);
        assert_eq!(toml_config.reclaimer.sweep_interval_secs, 5);
        assert_eq!(toml_config.auditorium.rows, 8);
    }
}
