use super::{KioskCommand, KioskController, Screen};
use crate::error::Result;

impl KioskController {
    /// Apply a user or lifecycle command. Commands that do not apply to the
    /// screen currently shown are ignored.
    pub(super) async fn handle_command(&mut self, command: KioskCommand) -> Result<()> {
        self.logger.debug(&format!("Command: {command:?}"));
        match command {
            KioskCommand::GrantLocation => {
                if self.accepts_input(Screen::Location, command) {
                    self.request_location();
                }
            }
            KioskCommand::ConfirmPayment => {
                if self.accepts_input(Screen::Payment, command) {
                    self.confirm_payment();
                }
            }
            KioskCommand::Exit => {
                if self.accepts_input(Screen::Success, command) {
                    self.request_transition(Screen::Exit).await;
                }
            }
            KioskCommand::SetVisibility { visible } => {
                self.state.visible = visible;
                self.logger.info(&format!(
                    "Kiosk {}",
                    if visible { "visible" } else { "hidden" }
                ));
                if self.state.screen == Screen::Charging && self.state.in_flight.is_none() {
                    self.apply_visibility(visible);
                }
            }
            KioskCommand::Reset => self.force_reset().await,
            // Handled by the run loop
            KioskCommand::Shutdown => {}
        }
        Ok(())
    }

    /// True when `screen` is shown and settled
    fn accepts_input(&self, screen: Screen, command: KioskCommand) -> bool {
        if self.state.screen == screen && self.state.in_flight.is_none() {
            return true;
        }
        self.logger.debug(&format!(
            "Ignoring {command:?} on {:?}",
            self.state.in_flight.unwrap_or(self.state.screen)
        ));
        false
    }
}
