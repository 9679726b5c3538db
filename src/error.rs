//! Error types and handling for SafraSphere
//!
//! This module defines the error types used throughout the kiosk, split into
//! the flow errors a user can cause (recovered locally and shown as a status
//! line) and the infrastructure errors of the surrounding service.

use thiserror::Error;

/// Result type alias for SafraSphere operations
pub type Result<T> = std::result::Result<T, SafraError>;

/// Main error type for SafraSphere
#[derive(Debug, Error)]
pub enum SafraError {
    /// Camera or geolocation permission refused by the user
    #[error("Permission denied: {device} - {message}")]
    PermissionDenied { device: String, message: String },

    /// Camera or geolocation not supported / not present
    #[error("Device unavailable: {device} - {message}")]
    DeviceUnavailable { device: String, message: String },

    /// Input rejected by the kiosk (e.g. QR payload mismatch)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A provider call exceeded its allotted time
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Payment processor errors
    #[error("Payment error: {message}")]
    Payment { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl SafraError {
    /// Create a new permission denied error
    pub fn permission_denied<S: Into<String>>(device: S, message: S) -> Self {
        Self::PermissionDenied {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a new device unavailable error
    pub fn device_unavailable<S: Into<String>>(device: S, message: S) -> Self {
        Self::DeviceUnavailable {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new payment error
    pub fn payment<S: Into<String>>(message: S) -> Self {
        Self::Payment {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Whether the error belongs to the user flow and is recovered on-screen
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. }
                | Self::DeviceUnavailable { .. }
                | Self::InvalidInput { .. }
                | Self::Timeout { .. }
                | Self::Payment { .. }
        )
    }

    /// Status line text shown on the kiosk for a flow error
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied { device, .. } if device == "camera" => {
                "Camera access required for QR scanning"
            }
            Self::PermissionDenied { .. } => "Location access required for charging",
            Self::DeviceUnavailable { device, .. } if device == "camera" => {
                "No camera available for QR scanning"
            }
            Self::DeviceUnavailable { .. } => "Location services are not available",
            Self::Timeout { .. } => "Request timed out - please try again",
            Self::InvalidInput { .. } => "Invalid QR Code - Please try again",
            Self::Payment { .. } => "Payment failed - please try again",
            _ => "Something went wrong - please try again",
        }
    }
}

impl From<std::io::Error> for SafraError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SafraError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SafraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<tokio::time::error::Elapsed> for SafraError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::timeout(err.to_string())
    }
}
