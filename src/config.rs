//! Configuration management for SafraSphere
//!
//! This module handles loading, validation, and management of the kiosk
//! configuration from YAML files. The configuration is read once at startup
//! and shared read-only afterwards.

use crate::error::{SafraError, Result};
use crate::geo::{Coordinates, EARTH_RADIUS_KM};
#[cfg(feature = "openapi")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct Config {
    /// Where the charger physically stands
    pub location: LocationConfig,

    /// QR code accepted by this charger
    pub qr: QrConfig,

    /// Charging simulation parameters
    pub charging: ChargingConfig,

    /// UI pacing delays
    pub timing: TimingConfig,

    /// Camera and geolocation request options
    pub devices: DevicesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// Number of completed sessions kept in memory
    pub session_history_size: usize,
}

/// Valid charger location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct LocationConfig {
    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lon: f64,

    /// Accepted radius, expressed in degrees of arc
    pub tolerance_degrees: f64,

    /// Reject users outside the tolerance. When false every reported
    /// position is accepted after the distance has been logged.
    pub enforce: bool,
}

impl LocationConfig {
    /// Configured charger position
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// Tolerance converted to kilometres along a great circle
    pub fn tolerance_km(&self) -> f64 {
        self.tolerance_degrees.to_radians() * EARTH_RADIUS_KM
    }
}

/// QR verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct QrConfig {
    /// Payload printed on the charger's QR sticker
    pub valid_payload: String,
}

/// Charging simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct ChargingConfig {
    /// Price per kWh in the configured currency
    pub rate_per_kwh: f64,

    /// Battery percentage at which charging completes
    pub max_battery_percent: f64,

    /// Battery percentage added per tick
    pub charging_speed_percent_per_tick: f64,

    /// Tick interval in milliseconds
    pub tick_interval_ms: u64,

    /// Assumed vehicle battery capacity
    pub battery_capacity_kwh: f64,

    /// Symbol prefixed to displayed amounts
    pub currency_symbol: String,
}

/// UI pacing delays in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct TimingConfig {
    pub splash_ms: u64,
    /// Exit animation of the outgoing screen
    pub transition_ms: u64,
    pub qr_verify_ms: u64,
    pub qr_advance_ms: u64,
    /// How long the invalid-code status stays before scanning resumes
    pub qr_reset_ms: u64,
    pub location_verify_ms: u64,
    pub location_advance_ms: u64,
    pub location_reject_ms: u64,
    pub charging_complete_ms: u64,
    pub payment_settle_ms: u64,
    pub exit_ms: u64,
}

impl TimingConfig {
    pub const fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Options passed to the camera and geolocation providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct DevicesConfig {
    /// Preferred camera resolution
    pub camera_width: u32,
    pub camera_height: u32,

    /// Upper bound for camera acquisition (covers the permission prompt)
    pub camera_timeout_ms: u64,

    pub geolocation_high_accuracy: bool,
    pub geolocation_timeout_ms: u64,
    pub geolocation_max_age_ms: u64,

    /// Upper bound for the payment processor to settle
    pub payment_timeout_ms: u64,

    /// Position reported by the simulated geolocation provider
    pub simulated_lat: f64,
    pub simulated_lon: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional override for console output level
    pub console_level: Option<String>,

    /// Optional override for file output level
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server binding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(JsonSchema))]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("SAFRASPHERE_CONFIG") {
            return Self::from_file(path);
        }

        let default_paths = [
            "safrasphere_config.yaml",
            "/data/safrasphere_config.yaml",
            "/etc/safrasphere/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.location.lat) {
            return Err(SafraError::validation(
                "location.lat",
                "Must be within -90..=90",
            ));
        }

        if !(-180.0..=180.0).contains(&self.location.lon) {
            return Err(SafraError::validation(
                "location.lon",
                "Must be within -180..=180",
            ));
        }

        if self.location.tolerance_degrees < 0.0 {
            return Err(SafraError::validation(
                "location.tolerance_degrees",
                "Must not be negative",
            ));
        }

        if self.qr.valid_payload.trim().is_empty() {
            return Err(SafraError::validation(
                "qr.valid_payload",
                "Payload cannot be empty",
            ));
        }

        let charging = &self.charging;
        if charging.rate_per_kwh < 0.0 {
            return Err(SafraError::validation(
                "charging.rate_per_kwh",
                "Must not be negative",
            ));
        }

        if charging.max_battery_percent <= 0.0 || charging.max_battery_percent > 100.0 {
            return Err(SafraError::validation(
                "charging.max_battery_percent",
                "Must be within (0, 100]",
            ));
        }

        if charging.charging_speed_percent_per_tick <= 0.0 {
            return Err(SafraError::validation(
                "charging.charging_speed_percent_per_tick",
                "Must be positive",
            ));
        }

        if charging.tick_interval_ms == 0 {
            return Err(SafraError::validation(
                "charging.tick_interval_ms",
                "Must be greater than 0",
            ));
        }

        if charging.battery_capacity_kwh <= 0.0 {
            return Err(SafraError::validation(
                "charging.battery_capacity_kwh",
                "Must be positive",
            ));
        }

        if self.web.port == 0 {
            return Err(SafraError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.qr.valid_payload, "SAFRASPHERE_CHARGER_KARUR_001");
        assert_eq!(config.charging.tick_interval_ms, 1000);
        assert!((config.charging.rate_per_kwh - 12.0).abs() < f64::EPSILON);
        assert!(!config.location.enforce);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.qr.valid_payload = "   ".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.charging.charging_speed_percent_per_tick = 0.0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.location.lat = 91.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tolerance_in_kilometres() {
        let config = Config::default();
        // 0.01 degrees of arc is a little over a kilometre
        let km = config.location.tolerance_km();
        assert!((km - 1.112).abs() < 0.001, "got {km}");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "qr:\n  valid_payload: OTHER_CHARGER\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.qr.valid_payload, "OTHER_CHARGER");
        assert_eq!(config.timing.splash_ms, 4000);
    }
}
