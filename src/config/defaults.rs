use super::*;

impl Default for LocationConfig {
    fn default() -> Self {
        // Karur, Tamil Nadu
        Self {
            lat: 10.9601,
            lon: 78.0766,
            tolerance_degrees: 0.01,
            enforce: false,
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            valid_payload: "SAFRASPHERE_CHARGER_KARUR_001".to_string(),
        }
    }
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            rate_per_kwh: 12.0,
            max_battery_percent: 100.0,
            charging_speed_percent_per_tick: 2.0,
            tick_interval_ms: 1000,
            battery_capacity_kwh: 50.0,
            currency_symbol: "₹".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            splash_ms: 4000,
            transition_ms: 300,
            qr_verify_ms: 1000,
            qr_advance_ms: 1500,
            qr_reset_ms: 2000,
            location_verify_ms: 2000,
            location_advance_ms: 2000,
            location_reject_ms: 3000,
            charging_complete_ms: 1000,
            payment_settle_ms: 2000,
            exit_ms: 5000,
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            camera_width: 1280,
            camera_height: 720,
            camera_timeout_ms: 30_000,
            geolocation_high_accuracy: true,
            geolocation_timeout_ms: 10_000,
            geolocation_max_age_ms: 60_000,
            payment_timeout_ms: 30_000,
            simulated_lat: 10.9601,
            simulated_lon: 78.0766,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/safrasphere.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: LocationConfig::default(),
            qr: QrConfig::default(),
            charging: ChargingConfig::default(),
            timing: TimingConfig::default(),
            devices: DevicesConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            session_history_size: 100,
        }
    }
}
