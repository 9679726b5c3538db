//! Kiosk screen orchestration
//!
//! [`KioskController`] owns the whole kiosk state and runs as a single task.
//! User commands arrive over an mpsc channel, while timers, the camera scan,
//! geolocation, payment and the charging ticker report back through an
//! internal signal channel. Because one task applies every change, transitions
//! are serialized: a transition requested while another is playing is
//! ignored.
//!
//! A transition has two phases. Leaving a screen cancels everything scoped to
//! it (timers, background lookups, the camera stream) and marks the UI
//! inactive; once the exit animation delay has elapsed the target screen is
//! activated and its entry action runs.

use crate::config::Config;
use crate::error::{Result, SafraError};
use crate::logging::{StructuredLogger, get_logger};
use crate::providers::Providers;
use crate::render::{Renderer, UiState, WatchRenderer};
use crate::session::{SessionLedger, SessionRecord};
use crate::simulator::{ChargingSimulator, SimulatorParams};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Level;

mod commands;
mod screens;
mod signals;
mod tasks;
mod transition;
mod types;


use tasks::ScreenTasks;
use types::Signal;
pub use types::{KioskCommand, KioskState, Screen};

/// Camera scan running on the QR screen
struct ScanTask {
    handle: JoinHandle<()>,
    /// Wakes the scan loop after a rejected code
    resume: Arc<Notify>,
}

/// Cloneable access to a running controller
#[derive(Clone)]
pub struct KioskHandle {
    commands: mpsc::UnboundedSender<KioskCommand>,
    ui: watch::Receiver<UiState>,
    sessions: watch::Receiver<Vec<SessionRecord>>,
}

impl KioskHandle {
    /// Queue a command for the controller
    pub fn send(&self, command: KioskCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| SafraError::generic("kiosk controller has stopped"))
    }

    /// Latest published UI state
    pub fn ui_state(&self) -> UiState {
        self.ui.borrow().clone()
    }

    pub fn subscribe_ui(&self) -> watch::Receiver<UiState> {
        self.ui.clone()
    }

    /// Completed sessions, newest first
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.borrow().clone()
    }
}

/// Single owner of the kiosk state machine
pub struct KioskController {
    config: Arc<Config>,
    providers: Providers,
    state: KioskState,
    simulator: ChargingSimulator,
    ledger: SessionLedger,
    tasks: ScreenTasks,
    scan: Option<ScanTask>,
    commands_rx: mpsc::UnboundedReceiver<KioskCommand>,
    commands_tx: mpsc::UnboundedSender<KioskCommand>,
    signals_rx: mpsc::UnboundedReceiver<Signal>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    renderers: Vec<Arc<dyn Renderer>>,
    ui_rx: watch::Receiver<UiState>,
    sessions_tx: watch::Sender<Vec<SessionRecord>>,
    logger: StructuredLogger,
}

impl KioskController {
    /// Create a controller; nothing happens until [`run`](Self::run) is awaited
    pub fn new(config: Arc<Config>, providers: Providers) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (sessions_tx, _) = watch::channel(Vec::new());

        let state = KioskState::default();
        let watch_renderer = WatchRenderer::new(state.ui.clone());
        let ui_rx = watch_renderer.subscribe();

        let logger = get_logger("kiosk");
        logger.info(&format!(
            "Kiosk configured for charger {} at ({:.4}, {:.4})",
            config.qr.valid_payload, config.location.lat, config.location.lon
        ));

        Self {
            simulator: ChargingSimulator::new(SimulatorParams::from(&config.charging)),
            ledger: SessionLedger::new(config.session_history_size),
            tasks: ScreenTasks::new(signals_tx.clone()),
            config,
            providers,
            state,
            scan: None,
            commands_rx,
            commands_tx,
            signals_rx,
            signals_tx,
            renderers: vec![Arc::new(watch_renderer)],
            ui_rx,
            sessions_tx,
            logger,
        }
    }

    /// Add a renderer that receives every published state
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderers.push(renderer);
        self
    }

    pub fn handle(&self) -> KioskHandle {
        KioskHandle {
            commands: self.commands_tx.clone(),
            ui: self.ui_rx.clone(),
            sessions: self.sessions_tx.subscribe(),
        }
    }

    pub const fn state(&self) -> &KioskState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the kiosk until [`KioskCommand::Shutdown`] or until every handle
    /// has been dropped
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting kiosk controller");
        self.enter_screen(Screen::Splash);
        self.publish();

        loop {
            tokio::select! {
                command = self.commands_rx.recv() => match command {
                    Some(KioskCommand::Shutdown) | None => break,
                    Some(command) => {
                        if let Err(e) = self.handle_command(command).await {
                            self.report_failure(&format!("Command {command:?}"), &e);
                        }
                    }
                },
                Some(signal) = self.signals_rx.recv() => {
                    if let Err(e) = self.handle_signal(signal).await {
                        self.report_failure("Signal handling", &e);
                    }
                }
            }
            self.publish();
        }

        self.shutdown().await;
        Ok(())
    }

    /// Cancel all screen work and release devices
    async fn shutdown(&mut self) {
        self.logger.info("Kiosk controller shutting down");
        self.tasks.cancel_all();
        self.stop_camera().await;
        self.simulator.stop();
    }

    /// Log a failed command or signal; the session keeps running either way
    fn report_failure(&self, what: &str, e: &SafraError) {
        if failure_level(e) == Level::WARN {
            self.logger.warn(&format!("{what} rejected: {e}"));
        } else {
            self.logger.error(&format!("{what} failed: {e}"));
        }
    }

    /// Hand the current UI state to every renderer
    fn publish(&mut self) {
        self.state.ui.updated_at = Utc::now();
        for renderer in &self.renderers {
            renderer.render(&self.state.ui);
        }
    }

    /// True when `epoch` belongs to the screen currently shown
    const fn is_current(&self, epoch: u64) -> bool {
        epoch == self.state.epoch && self.state.in_flight.is_none()
    }

    /// Logger tagged with the current screen and session
    fn screen_logger(&self) -> StructuredLogger {
        let screen = format!("{:?}", self.state.screen);
        let token = self.simulator.session().session_token.clone();
        self.logger.with_context(|ctx| {
            let ctx = ctx.with_screen(screen);
            match token {
                Some(token) => ctx.with_session_token(token),
                None => ctx,
            }
        })
    }
}

/// Flow errors were already shown on screen and only warrant a warning
const fn failure_level(e: &SafraError) -> Level {
    if e.is_recoverable() {
        Level::WARN
    } else {
        Level::ERROR
    }
}
