use super::types::TimerKind;
use super::{KioskController, Screen};

impl KioskController {
    /// Phase one of a transition: leave the current screen and start the
    /// exit animation. Returns false when the request was ignored.
    pub(crate) async fn request_transition(&mut self, target: Screen) -> bool {
        if let Some(pending) = self.state.in_flight {
            self.logger.warn(&format!(
                "Ignoring transition to {target:?}; transition to {pending:?} in progress"
            ));
            return false;
        }

        let from = self.state.screen;
        if !from.can_transition_to(target) {
            self.logger.warn(&format!(
                "Refusing transition {from:?} -> {target:?}: not part of the flow"
            ));
            return false;
        }

        self.begin_transition(target).await;
        true
    }

    /// Reset the session and go back to the splash screen from wherever we are,
    /// pre-empting a transition that is already playing
    pub(crate) async fn force_reset(&mut self) {
        self.logger.info("Resetting kiosk session");
        self.state.in_flight = None;
        self.begin_transition(Screen::Splash).await;
    }

    async fn begin_transition(&mut self, target: Screen) {
        let from = self.state.screen;
        self.logger
            .info(&format!("Transitioning to screen: {target:?} (from {from:?})"));

        self.leave_screen(from).await;

        self.state.epoch = self.state.epoch.wrapping_add(1);
        self.state.in_flight = Some(target);
        self.state.ui.active = false;

        self.tasks.schedule(
            self.state.epoch,
            self.config.timing.transition(),
            TimerKind::TransitionSettled,
        );
    }

    /// Phase two: activate the target screen and run its entry action
    pub(crate) fn complete_transition(&mut self) {
        let Some(target) = self.state.in_flight.take() else {
            return;
        };
        self.enter_screen(target);
    }

    /// Cancel everything scoped to `screen`. The camera is released here, so
    /// no later entry action can run while a stream is still open.
    async fn leave_screen(&mut self, screen: Screen) {
        let pending = self.tasks.pending();
        if pending > 0 {
            self.logger
                .debug(&format!("Cancelling {pending} task(s) of {screen:?}"));
        }
        self.tasks.cancel_all();
        self.stop_camera().await;

        match screen {
            Screen::Charging => {
                self.simulator.stop();
            }
            Screen::Location => self.state.location_pending = false,
            Screen::Payment => self.state.payment_processing = false,
            _ => {}
        }
    }

    pub(crate) fn enter_screen(&mut self, screen: Screen) {
        self.state.screen = screen;
        self.state.ui.screen = screen;
        self.state.ui.active = true;
        self.state.ui.status = None;

        self.screen_logger().debug("Entry action");
        match screen {
            Screen::Splash => self.enter_splash(),
            Screen::QrScan => self.enter_qr_scan(),
            Screen::Location => self.enter_location(),
            Screen::Charging => self.enter_charging(),
            Screen::Payment => self.enter_payment(),
            Screen::Success => self.enter_success(),
            Screen::Exit => self.enter_exit(),
        }
    }
}
