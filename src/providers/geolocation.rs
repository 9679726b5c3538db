//! Position lookup for the location check.

use crate::error::{Result, SafraError};
use crate::geo::Coordinates;
use async_trait::async_trait;
use std::time::Duration;

/// Options forwarded to the geolocation provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    /// Upper bound for the lookup, enforced by the caller as well
    pub timeout: Duration,
    /// Oldest cached position the provider may return
    pub maximum_age: Duration,
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self, options: &GeolocationOptions) -> Result<Coordinates>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Behaviour {
    Report(Coordinates),
    Deny,
    Unsupported,
    /// Never answers, so the caller's timeout fires
    Stall,
}

/// Geolocation provider with a scripted answer
#[derive(Debug, Clone, Copy)]
pub struct SimulatedGeolocation {
    behaviour: Behaviour,
}

impl SimulatedGeolocation {
    /// Always report `position`
    pub const fn at(position: Coordinates) -> Self {
        Self {
            behaviour: Behaviour::Report(position),
        }
    }

    pub const fn denied() -> Self {
        Self {
            behaviour: Behaviour::Deny,
        }
    }

    pub const fn unsupported() -> Self {
        Self {
            behaviour: Behaviour::Unsupported,
        }
    }

    pub const fn stalled() -> Self {
        Self {
            behaviour: Behaviour::Stall,
        }
    }
}

#[async_trait]
impl GeolocationProvider for SimulatedGeolocation {
    async fn current_position(&self, options: &GeolocationOptions) -> Result<Coordinates> {
        tracing::debug!(
            "Geolocation lookup (high_accuracy={}, timeout={:?}, maximum_age={:?})",
            options.high_accuracy,
            options.timeout,
            options.maximum_age
        );
        match self.behaviour {
            Behaviour::Report(position) => Ok(position),
            Behaviour::Deny => Err(SafraError::permission_denied(
                "geolocation",
                "location permission was refused",
            )),
            Behaviour::Unsupported => Err(SafraError::device_unavailable(
                "geolocation",
                "geolocation is not supported",
            )),
            Behaviour::Stall => {
                std::future::pending::<()>().await;
                Err(SafraError::timeout("geolocation never answered"))
            }
        }
    }
}
