use super::types::{Signal, TimerKind};
use super::{KioskController, Screen};
use crate::error::Result;

impl KioskController {
    /// Apply a signal from a timer or background task. Signals produced by a
    /// screen that has since been left are dropped here.
    pub(super) async fn handle_signal(&mut self, signal: Signal) -> Result<()> {
        match signal {
            Signal::Timer {
                epoch,
                timer: TimerKind::TransitionSettled,
            } => {
                // Fires while the transition is still in flight, so only the
                // epoch is compared
                if epoch == self.state.epoch {
                    self.complete_transition();
                }
                Ok(())
            }
            Signal::Timer { epoch, timer } => {
                if !self.is_current(epoch) {
                    self.logger
                        .trace(&format!("Dropping stale timer {timer:?}"));
                    return Ok(());
                }
                self.on_timer(timer).await
            }
            Signal::CameraOpened { epoch } => {
                if self.is_current(epoch) {
                    self.on_camera_opened();
                }
                Ok(())
            }
            Signal::CameraFailed { epoch, error } => {
                if self.is_current(epoch) {
                    self.on_camera_failed(&error).await;
                }
                Ok(())
            }
            Signal::QrDetected { epoch, payload } => {
                if self.is_current(epoch) {
                    self.on_qr_detected(payload);
                }
                Ok(())
            }
            Signal::LocationResolved { epoch, result } => {
                if !self.is_current(epoch) {
                    return Ok(());
                }
                self.on_location_resolved(result)
            }
            Signal::PaymentSettled { epoch, result } => {
                if !self.is_current(epoch) {
                    return Ok(());
                }
                self.on_payment_settled(result).await
            }
            Signal::Tick(tick) => {
                if self.state.screen == Screen::Charging && self.state.in_flight.is_none() {
                    self.on_tick(tick);
                }
                Ok(())
            }
            Signal::TaskFailed { task, message } => {
                self.screen_logger()
                    .error(&format!("Background task '{task}' panicked: {message}"));
                Ok(())
            }
        }
    }

    async fn on_timer(&mut self, timer: TimerKind) -> Result<()> {
        match timer {
            TimerKind::SplashElapsed => {
                self.request_transition(Screen::QrScan).await;
            }
            TimerKind::QrVerify(payload) => return self.verify_qr(&payload).await,
            TimerKind::QrAdvance => {
                self.request_transition(Screen::Location).await;
            }
            TimerKind::QrStatusReset => self.reset_qr_status(),
            TimerKind::LocationVerify(position) => return self.verify_location(position),
            TimerKind::LocationAdvance => {
                self.request_transition(Screen::Charging).await;
            }
            TimerKind::LocationReject => {
                self.request_transition(Screen::QrScan).await;
            }
            TimerKind::ChargingComplete => {
                self.request_transition(Screen::Payment).await;
            }
            TimerKind::ExitElapsed => {
                self.request_transition(Screen::Splash).await;
            }
            // Handled before the epoch check
            TimerKind::TransitionSettled => {}
        }
        Ok(())
    }
}
