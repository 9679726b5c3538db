use super::types::{Signal, TimerKind};
use super::{KioskController, ScanTask, Screen};
use crate::error::{Result, SafraError};
use crate::geo::{Coordinates, haversine_km};
use crate::identifiers;
use crate::providers::{
    CameraLease, CameraRequest, FacingMode, GeolocationOptions, PaymentConfirmation,
    PaymentSummary,
};
use crate::render::{
    ChargingView, PaymentView, ReceiptView, StatusLine, format_battery, format_energy,
    format_money,
};
use crate::session::SessionRecord;
use crate::simulator::{SimulatorState, TickOutcome, format_elapsed};
use chrono::{Local, Utc};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{Duration, timeout};

const SCAN_PROMPT: &str = "Position QR code within the frame";
const NEAR_CHARGER: &str = "You must be near the charger to start charging";

impl KioskController {
    fn delay(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn schedule(&mut self, ms: u64, timer: TimerKind) {
        self.tasks
            .schedule(self.state.epoch, Self::delay(ms), timer);
    }

    // Splash

    pub(super) fn enter_splash(&mut self) {
        // Full session reset: every path back to the splash screen starts clean
        self.simulator.reset();
        self.state.location_pending = false;
        self.state.payment_processing = false;
        self.state.confirmation = None;
        self.state.ui.charging = ChargingView::default();
        self.state.ui.payment = None;
        self.state.ui.receipt = None;
        self.state.ui.camera_active = false;

        self.schedule(self.config.timing.splash_ms, TimerKind::SplashElapsed);
    }

    // QR scan

    pub(super) fn enter_qr_scan(&mut self) {
        self.state.ui.status = Some(StatusLine::info("Requesting camera access..."));
        self.spawn_scan();
    }

    /// Acquire the camera and decode frames until a payload shows up. The
    /// lease lives inside the task, so aborting the task releases the camera.
    fn spawn_scan(&mut self) {
        let epoch = self.state.epoch;
        let camera = Arc::clone(&self.providers.camera);
        let decoder = Arc::clone(&self.providers.decoder);
        let signals = self.signals_tx.clone();
        let resume = Arc::new(Notify::new());
        let wake = Arc::clone(&resume);
        let devices = &self.config.devices;
        let request = CameraRequest {
            facing: FacingMode::Environment,
            ideal_width: devices.camera_width,
            ideal_height: devices.camera_height,
        };
        let acquire_timeout = Self::delay(devices.camera_timeout_ms);

        let handle = tokio::spawn(async move {
            let stream = match timeout(acquire_timeout, camera.acquire(&request)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(error)) => {
                    let _ = signals.send(Signal::CameraFailed { epoch, error });
                    return;
                }
                Err(elapsed) => {
                    let _ = signals.send(Signal::CameraFailed {
                        epoch,
                        error: elapsed.into(),
                    });
                    return;
                }
            };
            let mut lease = CameraLease::new(stream);
            if signals.send(Signal::CameraOpened { epoch }).is_err() {
                return;
            }

            loop {
                let Some(frame) = lease.next_frame().await else {
                    let _ = signals.send(Signal::CameraFailed {
                        epoch,
                        error: SafraError::device_unavailable("camera", "video stream ended"),
                    });
                    return;
                };
                if let Some(payload) = decoder.decode(&frame) {
                    if signals.send(Signal::QrDetected { epoch, payload }).is_err() {
                        return;
                    }
                    // Hold the stream while the code is verified
                    wake.notified().await;
                }
            }
        });

        self.scan = Some(ScanTask { handle, resume });
    }

    /// Stop the scan task and wait until its camera lease has been dropped
    pub(super) async fn stop_camera(&mut self) {
        let Some(scan) = self.scan.take() else {
            return;
        };
        scan.handle.abort();
        match scan.handle.await {
            Err(e) if e.is_panic() => {
                self.logger.error(&format!("QR scan task panicked: {e}"));
            }
            _ => {}
        }
        self.state.ui.camera_active = false;
        self.logger.debug("Camera stream released");
    }

    pub(super) fn on_camera_opened(&mut self) {
        self.state.ui.camera_active = true;
        self.state.ui.status = Some(StatusLine::info(format!("Camera ready - {SCAN_PROMPT}")));
    }

    pub(super) async fn on_camera_failed(&mut self, error: &SafraError) {
        self.screen_logger()
            .error(&format!("Camera access failed: {error}"));
        self.stop_camera().await;
        self.state.ui.status = Some(StatusLine::error(error.status_message()));
    }

    pub(super) fn on_qr_detected(&mut self, payload: String) {
        self.screen_logger()
            .info(&format!("QR Code detected: {payload}"));
        self.state.ui.status = Some(StatusLine::info("QR Code detected - Verifying..."));
        self.schedule(self.config.timing.qr_verify_ms, TimerKind::QrVerify(payload));
    }

    pub(super) async fn verify_qr(&mut self, payload: &str) -> Result<()> {
        if payload == self.config.qr.valid_payload {
            self.state.ui.status = Some(StatusLine::success(
                "QR Code verified! Checking location...",
            ));
            self.stop_camera().await;
            self.schedule(self.config.timing.qr_advance_ms, TimerKind::QrAdvance);
            return Ok(());
        }

        let error = SafraError::invalid_input(format!("unexpected QR payload {payload:?}"));
        self.state.ui.status = Some(StatusLine::error(error.status_message()));
        self.schedule(self.config.timing.qr_reset_ms, TimerKind::QrStatusReset);
        Err(error)
    }

    pub(super) fn reset_qr_status(&mut self) {
        self.state.ui.status = Some(StatusLine::info(SCAN_PROMPT));
        if let Some(scan) = &self.scan {
            scan.resume.notify_one();
        }
    }

    // Location

    pub(super) fn enter_location(&mut self) {
        self.state.location_pending = false;
        self.state.ui.status = Some(StatusLine::info(
            "Allow location access to verify you are at the charger",
        ));
    }

    pub(super) fn request_location(&mut self) {
        if self.state.location_pending {
            self.logger.debug("Location lookup already in progress");
            return;
        }
        self.state.location_pending = true;
        self.state.ui.status = Some(StatusLine::info("Requesting location access..."));

        let epoch = self.state.epoch;
        let provider = Arc::clone(&self.providers.geolocation);
        let devices = &self.config.devices;
        let options = GeolocationOptions {
            high_accuracy: devices.geolocation_high_accuracy,
            timeout: Self::delay(devices.geolocation_timeout_ms),
            maximum_age: Self::delay(devices.geolocation_max_age_ms),
        };

        self.tasks.spawn_op("geolocation", async move {
            let result = match timeout(options.timeout, provider.current_position(&options)).await
            {
                Ok(result) => result,
                Err(elapsed) => Err(elapsed.into()),
            };
            Signal::LocationResolved { epoch, result }
        });
    }

    pub(super) fn on_location_resolved(&mut self, result: Result<Coordinates>) -> Result<()> {
        match result {
            Ok(position) => {
                self.state.ui.status = Some(StatusLine::info("Verifying your location..."));
                self.schedule(
                    self.config.timing.location_verify_ms,
                    TimerKind::LocationVerify(position),
                );
                Ok(())
            }
            Err(error) => {
                self.state.ui.status = Some(StatusLine::error(error.status_message()));
                self.schedule(
                    self.config.timing.location_reject_ms,
                    TimerKind::LocationReject,
                );
                Err(error)
            }
        }
    }

    /// Distance gate. With `location.enforce` off every position passes,
    /// but the measured distance is still logged.
    pub(super) fn verify_location(&mut self, position: Coordinates) -> Result<()> {
        let location = &self.config.location;
        let distance_km = haversine_km(position, location.coordinates());
        let within = distance_km <= location.tolerance_km();
        self.logger.info(&format!(
            "Distance from charger: {distance_km:.3} km (tolerance {:.3} km, enforce={})",
            location.tolerance_km(),
            location.enforce
        ));

        if within || !location.enforce {
            let token = identifiers::session_token();
            self.simulator.session_mut().assign_token(token.clone())?;
            self.logger
                .info(&format!("Session token generated: {token}"));
            self.state.ui.status = Some(StatusLine::success(
                "Location verified! Generating session token...",
            ));
            self.state.ui.charging.session_id = Some(token);
            self.schedule(
                self.config.timing.location_advance_ms,
                TimerKind::LocationAdvance,
            );
            return Ok(());
        }

        self.state.ui.status = Some(StatusLine::error(NEAR_CHARGER));
        self.schedule(
            self.config.timing.location_reject_ms,
            TimerKind::LocationReject,
        );
        Ok(())
    }

    // Charging

    pub(super) fn enter_charging(&mut self) {
        self.simulator.begin_session(Utc::now());
        if self.state.visible {
            self.start_ticker();
        } else {
            self.logger
                .info("Kiosk hidden; charging starts when it becomes visible");
        }
        self.refresh_charging_view();
    }

    fn tick_emitter(&self) -> impl FnMut(crate::simulator::Tick) -> bool + Send + 'static {
        let signals = self.signals_tx.clone();
        move |tick| signals.send(Signal::Tick(tick)).is_ok()
    }

    fn start_ticker(&mut self) {
        let emit = self.tick_emitter();
        self.simulator.start(emit);
    }

    /// Pause on hide, resume (or start late) on show
    pub(super) fn apply_visibility(&mut self, visible: bool) {
        if visible {
            let emit = self.tick_emitter();
            match self.simulator.state() {
                SimulatorState::Idle => {
                    self.simulator.start(emit);
                }
                SimulatorState::Paused => {
                    self.simulator.resume(emit);
                }
                SimulatorState::Running | SimulatorState::Completed => {}
            }
        } else {
            self.simulator.pause();
        }
        self.refresh_charging_view();
    }

    pub(super) fn on_tick(&mut self, tick: crate::simulator::Tick) {
        match self.simulator.on_tick(tick) {
            TickOutcome::Ignored => return,
            TickOutcome::Progress => {}
            TickOutcome::Completed => {
                self.screen_logger().info("Charging complete");
                self.schedule(
                    self.config.timing.charging_complete_ms,
                    TimerKind::ChargingComplete,
                );
            }
        }
        self.refresh_charging_view();
    }

    fn refresh_charging_view(&mut self) {
        let session = self.simulator.session();
        let symbol = &self.config.charging.currency_symbol;
        self.state.ui.charging = ChargingView {
            session_id: session.session_token.clone(),
            battery_percent: session.battery_percent(),
            battery_display: format_battery(session.battery_percent()),
            energy_kwh: session.energy_consumed_kwh(),
            energy_display: format_energy(session.energy_consumed_kwh()),
            cost: session.total_cost(),
            cost_display: format_money(symbol, session.total_cost()),
            elapsed: format_elapsed(self.simulator.elapsed()),
            paused: self.simulator.state() == SimulatorState::Paused,
        };
    }

    // Payment

    fn payment_summary(&self) -> PaymentSummary {
        let session = self.simulator.session();
        PaymentSummary {
            session_token: session.session_token.clone(),
            energy_kwh: session.energy_consumed_kwh(),
            amount: session.total_cost(),
            currency_symbol: self.config.charging.currency_symbol.clone(),
            duration_secs: self.simulator.elapsed().as_secs(),
        }
    }

    pub(super) fn enter_payment(&mut self) {
        let summary = self.payment_summary();
        self.state.payment_processing = false;
        self.state.ui.payment = Some(PaymentView {
            units: format!("{} kWh", format_energy(summary.energy_kwh)),
            amount: format_money(&summary.currency_symbol, summary.amount),
            duration: format_elapsed(Duration::from_secs(summary.duration_secs)),
            processing: false,
        });
    }

    pub(super) fn confirm_payment(&mut self) {
        if self.state.payment_processing {
            self.logger.debug("Payment already processing");
            return;
        }
        self.state.payment_processing = true;
        if let Some(view) = self.state.ui.payment.as_mut() {
            view.processing = true;
        }
        self.state.ui.status = Some(StatusLine::info("Processing..."));

        let epoch = self.state.epoch;
        let summary = self.payment_summary();
        let processor = Arc::clone(&self.providers.payment);
        let limit = Self::delay(self.config.devices.payment_timeout_ms);
        self.logger.info(&format!(
            "Processing payment of {}",
            format_money(&summary.currency_symbol, summary.amount)
        ));

        self.tasks.spawn_op("payment", async move {
            let result = match timeout(limit, processor.settle(&summary)).await {
                Ok(result) => result,
                Err(elapsed) => Err(elapsed.into()),
            };
            Signal::PaymentSettled { epoch, result }
        });
    }

    pub(super) async fn on_payment_settled(
        &mut self,
        result: Result<PaymentConfirmation>,
    ) -> Result<()> {
        self.state.payment_processing = false;
        match result {
            Ok(confirmation) => {
                self.logger.info("Payment successful");
                self.state.confirmation = Some(confirmation);
                self.request_transition(Screen::Success).await;
                Ok(())
            }
            Err(error) => {
                if let Some(view) = self.state.ui.payment.as_mut() {
                    view.processing = false;
                }
                self.state.ui.status = Some(StatusLine::error(error.status_message()));
                Err(error)
            }
        }
    }

    // Success

    pub(super) fn enter_success(&mut self) {
        let transaction_id = identifiers::transaction_id();
        let summary = self.payment_summary();
        let paid_at = self
            .state
            .confirmation
            .as_ref()
            .map_or_else(Utc::now, |c| c.settled_at);

        let receipt = ReceiptView {
            transaction_id: transaction_id.clone(),
            date: paid_at
                .with_timezone(&Local)
                .format("%d/%m/%Y, %H:%M:%S")
                .to_string(),
            units: format!("{} kWh", format_energy(summary.energy_kwh)),
            amount: format_money(&summary.currency_symbol, summary.amount),
        };
        self.state.ui.receipt = Some(receipt);
        self.state.ui.status = Some(StatusLine::success("Payment successful"));

        self.ledger.record(SessionRecord {
            session_token: summary.session_token,
            transaction_id,
            started_at: self.simulator.session().started_at,
            paid_at,
            duration_secs: summary.duration_secs,
            energy_kwh: summary.energy_kwh,
            amount: summary.amount,
            currency_symbol: summary.currency_symbol,
        });
        self.sessions_tx.send_replace(self.ledger.snapshot());
    }

    // Exit

    pub(super) fn enter_exit(&mut self) {
        self.schedule(self.config.timing.exit_ms, TimerKind::ExitElapsed);
    }
}
