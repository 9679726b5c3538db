use safrasphere::config::Config;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.qr.valid_payload = "SAFRASPHERE_CHARGER_CHENNAI_007".to_string();
    cfg.location.enforce = true;
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.qr.valid_payload, "SAFRASPHERE_CHARGER_CHENNAI_007");
    assert!(loaded.location.enforce);
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn partial_yaml_keeps_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        b"charging:\n  rate_per_kwh: 15.5\ntiming:\n  splash_ms: 100\n",
    )
    .unwrap();
    let cfg = Config::from_file(tmp.path()).unwrap();

    assert_eq!(cfg.charging.rate_per_kwh, 15.5);
    assert_eq!(cfg.charging.battery_capacity_kwh, 50.0);
    assert_eq!(cfg.timing.splash_ms, 100);
    assert_eq!(cfg.timing.exit_ms, 5000);
    assert_eq!(cfg.qr.valid_payload, "SAFRASPHERE_CHARGER_KARUR_001");
    assert!(cfg.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    assert!(cfg.validate().is_ok());

    // Coordinates out of range
    cfg.location.lat = 91.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.location.lon = -181.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.location.tolerance_degrees = -0.5;
    assert!(cfg.validate().is_err());

    // Empty payload
    cfg = Config::default();
    cfg.qr.valid_payload = "   ".to_string();
    assert!(cfg.validate().is_err());

    // Charging parameters
    cfg = Config::default();
    cfg.charging.max_battery_percent = 120.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.charging.charging_speed_percent_per_tick = 0.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.charging.tick_interval_ms = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.charging.battery_capacity_kwh = 0.0;
    assert!(cfg.validate().is_err());

    // Invalid port
    cfg = Config::default();
    cfg.web.port = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn tolerance_is_converted_to_kilometres() {
    let cfg = Config::default();
    // 0.01 degrees of arc on the Earth's surface
    assert!((cfg.location.tolerance_km() - 1.112).abs() < 0.001);
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}
