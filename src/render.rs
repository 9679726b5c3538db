//! Declarative UI state published by the kiosk
//!
//! The controller never draws anything. After every change it builds a
//! [`UiState`] and hands it to its renderers; the web API, the SSE stream and
//! the log renderer are all consumers of this one value.

use crate::kiosk::Screen;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

/// Colour class of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Neutral / in-progress, gold
    Info,
    Success,
    Error,
}

impl Tone {
    /// CSS colour the kiosk front-end uses for this tone
    pub const fn color(self) -> &'static str {
        match self {
            Self::Info => "#FFD700",
            Self::Success => "#00ff88",
            Self::Error => "#ff4757",
        }
    }
}

/// A status message shown on the current screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
    pub color: &'static str,
}

impl StatusLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            color: tone.color(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Info)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Success)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Error)
    }
}

/// Live figures of the charging screen
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChargingView {
    pub session_id: Option<String>,
    pub battery_percent: f64,
    pub battery_display: String,
    pub energy_kwh: f64,
    pub energy_display: String,
    pub cost: f64,
    pub cost_display: String,
    /// `MM:SS` since charging began
    pub elapsed: String,
    pub paused: bool,
}

/// Summary on the payment screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentView {
    pub units: String,
    pub amount: String,
    pub duration: String,
    /// Confirm pressed, waiting for the processor
    pub processing: bool,
}

/// Receipt on the success screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptView {
    pub transaction_id: String,
    pub date: String,
    pub units: String,
    pub amount: String,
}

/// Everything a renderer needs to draw the kiosk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiState {
    pub screen: Screen,
    /// False while the screen is playing its exit animation
    pub active: bool,
    pub status: Option<StatusLine>,
    pub camera_active: bool,
    pub charging: ChargingView,
    pub payment: Option<PaymentView>,
    pub receipt: Option<ReceiptView>,
    pub updated_at: DateTime<Utc>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Splash,
            active: true,
            status: None,
            camera_active: false,
            charging: ChargingView::default(),
            payment: None,
            receipt: None,
            updated_at: Utc::now(),
        }
    }
}

/// Display side of the kiosk
pub trait Renderer: Send + Sync {
    fn render(&self, state: &UiState);
}

/// Publishes every state into a watch channel
pub struct WatchRenderer {
    tx: watch::Sender<UiState>,
}

impl WatchRenderer {
    pub fn new(initial: UiState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.tx.subscribe()
    }
}

impl Renderer for WatchRenderer {
    fn render(&self, state: &UiState) {
        // send_replace keeps the value even while nobody is subscribed
        self.tx.send_replace(state.clone());
    }
}

/// Logs screen and status changes
pub struct LogRenderer {
    logger: crate::logging::StructuredLogger,
    last: std::sync::Mutex<Option<(Screen, bool, Option<String>)>>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self {
            logger: crate::logging::get_logger("ui"),
            last: std::sync::Mutex::new(None),
        }
    }
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for LogRenderer {
    fn render(&self, state: &UiState) {
        let key = (
            state.screen,
            state.active,
            state.status.as_ref().map(|s| s.text.clone()),
        );
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if last.as_ref() == Some(&key) {
            return;
        }
        let status = key.2.as_deref().unwrap_or("");
        self.logger.debug(&format!(
            "{:?} {} {}",
            state.screen,
            if state.active { "shown" } else { "leaving" },
            status
        ));
        *last = Some(key);
    }
}

/// `₹600.00`
pub fn format_money(symbol: &str, amount: f64) -> String {
    format!("{symbol}{amount:.2}")
}

/// `50.0`
pub fn format_energy(kwh: f64) -> String {
    format!("{kwh:.1}")
}

/// `42%`
pub fn format_battery(percent: f64) -> String {
    format!("{}%", percent.round())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_matches_kiosk_display() {
        assert_eq!(format_money("₹", 600.0), "₹600.00");
        assert_eq!(format_money("₹", 12.345), "₹12.35");
        assert_eq!(format_energy(1.0), "1.0");
        assert_eq!(format_battery(41.6), "42%");
        assert_eq!(format_battery(100.0), "100%");
    }

    #[test]
    fn watch_renderer_keeps_latest() {
        let renderer = WatchRenderer::new(UiState::default());
        let rx = renderer.subscribe();
        let state = UiState {
            screen: Screen::QrScan,
            status: Some(StatusLine::error("Invalid QR Code - Please try again")),
            ..UiState::default()
        };
        renderer.render(&state);
        assert_eq!(rx.borrow().screen, Screen::QrScan);
        assert_eq!(rx.borrow().status.as_ref().unwrap().color, "#ff4757");
    }
}
