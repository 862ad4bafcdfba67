//! Boxoffice - in-memory cinema seat reservation service
//!
//! Holds seats atomically per show, confirms or reclaims pending holds on a
//! 15-minute deadline, and exposes the workflow over HTTP.
//!
//! Module structure:
//! - `domain/` - Core business types (SeatMap, Reservation, errors)
//! - `services/` - Business logic (Ledger, Engine, Reclaimer)
//! - `io/` - External interfaces (Catalog, Identity, HTTP)
//! - `infra/` - Infrastructure (Config, Clock, Metrics)

use boxoffice::infra::{Config, Metrics, SystemClock};
use boxoffice::io::http::{start_http_server, HttpState};
use boxoffice::io::{InMemoryIdentityProvider, InMemoryShowCatalog};
use boxoffice::services::{ExpiryReclaimer, ReservationEngine, ReservationLedger};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Boxoffice - cinema seat reservation service
#[derive(Parser, Debug)]
#[command(name = "boxoffice", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("boxoffice starting");

    let args = Args::parse();
    let config = Config::load_from_path(&Config::resolve_path(args.config.as_deref()));

    info!(
        config_file = %config.config_file(),
        service_id = %config.service_id(),
        hold_ttl_secs = %config.hold_ttl_secs(),
        sweep_interval_secs = %config.sweep_interval_secs(),
        http_port = %config.http_port(),
        auditorium_rows = %config.auditorium_rows(),
        seats_per_row = %config.seats_per_row(),
        demo_shows = %config.demo_shows(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Create shared components
    let clock = Arc::new(SystemClock);
    let metrics = Arc::new(Metrics::new());
    let ledger = Arc::new(ReservationLedger::new());
    let catalog = Arc::new(InMemoryShowCatalog::new());
    let identity = Arc::new(InMemoryIdentityProvider::new());

    // Seed the demo catalog
    if config.demo_shows() > 0 {
        catalog.seed_demo(
            config.demo_shows(),
            config.auditorium_rows(),
            config.seats_per_row(),
            config.seat_pricing(),
            chrono::Utc::now(),
        )?;
    }

    let engine = Arc::new(ReservationEngine::new(
        catalog.clone(),
        identity.clone(),
        ledger.clone(),
        clock.clone(),
        metrics.clone(),
        config.hold_ttl(),
    ));

    // Start HTTP server (if port > 0)
    if config.http_port() > 0 {
        let state = Arc::new(HttpState {
            engine: engine.clone(),
            catalog: catalog.clone(),
            identity: identity.clone(),
            metrics: metrics.clone(),
            service_id: config.service_id().to_string(),
        });
        let http_port = config.http_port();
        let http_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = start_http_server(http_port, state, http_shutdown).await {
                tracing::error!(error = %e, "HTTP server error");
            }
        });
    }

    // Start metrics reporter (lock-free reads with full summary)
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run the expiry reclaimer as the foreground loop
    let reclaimer = ExpiryReclaimer::new(
        ledger,
        catalog,
        clock,
        metrics,
        std::time::Duration::from_secs(config.sweep_interval_secs()),
    );
    reclaimer.run(shutdown_rx).await;

    info!("boxoffice shutdown complete");
    Ok(())
}
