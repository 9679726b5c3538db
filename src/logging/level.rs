use crate::error::{Result, SafraError};
use tracing::Level;

/// Parse a level name (case-insensitive; `WARNING` is accepted as `WARN`)
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(SafraError::config(format!("Invalid log level: {level_str}"))),
    }
}

/// Parse an optional per-output override, falling back to `base`
pub fn level_or(level_str: Option<&String>, base: Level) -> Level {
    level_str
        .and_then(|s| parse_log_level(s).ok())
        .unwrap_or(base)
}

pub fn level_rank(level: Level) -> u8 {
    match level {
        Level::TRACE => 0,
        Level::DEBUG => 1,
        Level::INFO => 2,
        Level::WARN => 3,
        _ => 4,
    }
}

/// The more verbose of two levels
pub fn min_level(a: Level, b: Level) -> Level {
    if level_rank(a) <= level_rank(b) { a } else { b }
}
