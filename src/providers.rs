//! External collaborators of the kiosk
//!
//! The kiosk never talks to hardware or payment networks directly. Camera,
//! QR decoding, geolocation and payment are reached through the traits in
//! this module; the simulated implementations back the demo binary and the
//! test-suite.

use crate::config::Config;
use crate::geo::Coordinates;
use std::sync::Arc;
use std::time::Duration;

pub mod camera;
pub mod decoder;
pub mod geolocation;
pub mod payment;

pub use camera::{
    CameraLease, CameraProvider, CameraRequest, CameraStats, CameraStream, FacingMode, Frame,
    FrameFeed, SimulatedCamera,
};
pub use decoder::{QrDecoder, TextFrameDecoder};
pub use geolocation::{GeolocationOptions, GeolocationProvider, SimulatedGeolocation};
pub use payment::{
    PaymentConfirmation, PaymentProcessor, PaymentSummary, SimulatedPaymentProcessor,
};

/// The set of collaborators a kiosk controller is wired with
#[derive(Clone)]
pub struct Providers {
    pub camera: Arc<dyn CameraProvider>,
    pub decoder: Arc<dyn QrDecoder>,
    pub geolocation: Arc<dyn GeolocationProvider>,
    pub payment: Arc<dyn PaymentProcessor>,
}

/// Simulated collaborators plus the handles used to drive them
pub struct SimulatedProviders {
    pub providers: Providers,
    /// Frames shown to the simulated camera
    pub feed: FrameFeed,
    pub camera_stats: Arc<CameraStats>,
}

impl Providers {
    /// Simulated collaborators configured from `config`: the camera shows
    /// whatever is pushed into the returned feed, geolocation reports
    /// `devices.simulated_lat/lon`, payments settle after `timing.payment_settle_ms`
    pub fn simulated(config: &Config) -> SimulatedProviders {
        let camera = SimulatedCamera::new();
        let feed = camera.feed();
        let camera_stats = camera.stats();
        let position = Coordinates::new(config.devices.simulated_lat, config.devices.simulated_lon);

        SimulatedProviders {
            providers: Self {
                camera: Arc::new(camera),
                decoder: Arc::new(TextFrameDecoder),
                geolocation: Arc::new(SimulatedGeolocation::at(position)),
                payment: Arc::new(SimulatedPaymentProcessor::new(Duration::from_millis(
                    config.timing.payment_settle_ms,
                ))),
            },
            feed,
            camera_stats,
        }
    }
}
