//! # SafraSphere - simulated EV charging kiosk
//!
//! A self-contained rendition of a charging kiosk: the user scans the
//! charger's QR code, proves they are standing next to it, watches a
//! simulated charge, pays and gets a receipt. Nothing talks to a real
//! backend; camera, geolocation and payment are pluggable collaborators with
//! simulated implementations.
//!
//! ## Flow
//!
//! Splash → QR scan → Location → Charging → Payment → Success → Exit → Splash
//!
//! ## Architecture
//!
//! - `config`: YAML configuration with defaults and validation
//! - `logging`: Structured logging and tracing
//! - `kiosk`: Screen state machine, run as a single controller task
//! - `simulator`: Tick-driven battery, energy and cost accrual
//! - `session`: Charging session counters and the completed-session ledger
//! - `providers`: Camera, QR decoder, geolocation and payment collaborators
//! - `render`: Declarative UI state handed to renderers
//! - `geo`: Great-circle distance for the location check
//! - `identifiers`: Session tokens and transaction ids
//! - `web`: HTTP API driving and observing the kiosk

pub mod config;
pub mod error;
pub mod geo;
pub mod identifiers;
pub mod kiosk;
pub mod logging;
pub mod providers;
pub mod render;
pub mod session;
pub mod simulator;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SafraError};
pub use kiosk::{KioskCommand, KioskController, KioskHandle, Screen};
