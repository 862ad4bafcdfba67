//! Integration tests for configuration loading

use boxoffice::infra::Config;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[service]
id = "boxoffice-test"

[hold]
ttl_secs = 120

[reclaimer]
sweep_interval_secs = 2

[metrics]
interval_secs = 15
http_port = 9091

[auditorium]
rows = 5
seats_per_row = 6
regular_price = 150
premium_price = 250
vip_price = 400

[catalog]
demo_shows = 2
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.service_id(), "boxoffice-test");
    assert_eq!(config.hold_ttl_secs(), 120);
    assert_eq!(config.sweep_interval_secs(), 2);
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.http_port(), 9091);
    assert_eq!(config.auditorium_rows(), 5);
    assert_eq!(config.seats_per_row(), 6);
    assert_eq!(config.demo_shows(), 2);

    let pricing = config.seat_pricing();
    assert_eq!(pricing.regular, Decimal::from(150));
    assert_eq!(pricing.premium, Decimal::from(250));
    assert_eq!(pricing.vip, Decimal::from(400));
}

#[test]
fn test_partial_config_uses_section_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();

    temp_file
        .write_all(b"[service]\nid = \"partial\"\n\n[hold]\nttl_secs = 60\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.service_id(), "partial");
    assert_eq!(config.hold_ttl_secs(), 60);
    // Unlisted sections fall back to defaults
    assert_eq!(config.sweep_interval_secs(), 5);
    assert_eq!(config.http_port(), 8080);
    assert_eq!(config.auditorium_rows(), 8);
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.service_id(), "boxoffice");
    assert_eq!(config.hold_ttl_secs(), 900);
    assert_eq!(config.sweep_interval_secs(), 5);
}
