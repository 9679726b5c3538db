use crate::error::SafraError;
use crate::geo::Coordinates;
use crate::providers::PaymentConfirmation;
use crate::render::UiState;
use crate::simulator::Tick;
use serde::{Deserialize, Serialize};

/// Kiosk screens, in flow order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Screen {
    Splash,
    QrScan,
    Location,
    Charging,
    Payment,
    Success,
    Exit,
}

impl Screen {
    /// Screens reachable from `self` through the regular flow. An explicit
    /// reset may additionally jump from any screen to [`Screen::Splash`].
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Splash => &[Self::QrScan],
            Self::QrScan => &[Self::Location],
            Self::Location => &[Self::Charging, Self::QrScan],
            Self::Charging => &[Self::Payment],
            Self::Payment => &[Self::Success],
            Self::Success => &[Self::Exit],
            Self::Exit => &[Self::Splash],
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.successors().contains(&target)
    }
}

/// Inputs from outside the controller (user actions and lifecycle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KioskCommand {
    /// User allowed location access on the location screen
    GrantLocation,
    ConfirmPayment,
    Exit,
    /// Page/app visibility changed
    SetVisibility { visible: bool },
    /// Drop the session and return to the splash screen
    Reset,
    Shutdown,
}

/// Screen-scoped delays
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TimerKind {
    SplashElapsed,
    /// Exit animation of the outgoing screen finished
    TransitionSettled,
    QrVerify(String),
    QrAdvance,
    QrStatusReset,
    LocationVerify(Coordinates),
    LocationAdvance,
    LocationReject,
    ChargingComplete,
    ExitElapsed,
}

/// Results fed back to the controller by timers and background work. Every
/// screen-scoped signal carries the epoch of the screen that produced it.
#[derive(Debug)]
pub(crate) enum Signal {
    Timer { epoch: u64, timer: TimerKind },
    CameraOpened { epoch: u64 },
    CameraFailed { epoch: u64, error: SafraError },
    QrDetected { epoch: u64, payload: String },
    LocationResolved {
        epoch: u64,
        result: crate::error::Result<Coordinates>,
    },
    PaymentSettled {
        epoch: u64,
        result: crate::error::Result<PaymentConfirmation>,
    },
    Tick(Tick),
    /// A background task panicked
    TaskFailed { task: &'static str, message: String },
}

/// Mutable state owned by the controller
#[derive(Debug, Clone)]
pub struct KioskState {
    /// Screen whose entry action last ran
    pub screen: Screen,
    /// Target of the transition currently playing, if any
    pub in_flight: Option<Screen>,
    /// Bumped whenever a screen is left; stale signals carry older values
    pub epoch: u64,
    pub visible: bool,
    /// A geolocation lookup or verification is under way
    pub location_pending: bool,
    /// Confirm pressed and payment not yet settled
    pub payment_processing: bool,
    pub confirmation: Option<PaymentConfirmation>,
    pub ui: UiState,
}

impl Default for KioskState {
    fn default() -> Self {
        Self {
            screen: Screen::Splash,
            in_flight: None,
            epoch: 0,
            visible: true,
            location_pending: false,
            payment_processing: false,
            confirmation: None,
            ui: UiState::default(),
        }
    }
}
