//! Charging session simulator
//!
//! Accrues battery percentage at a fixed step per tick and derives energy and
//! cost from it. Ticks come from a periodic task owned by the simulator; the
//! task is spawned by [`ChargingSimulator::start`] / [`ChargingSimulator::resume`]
//! and aborted by [`ChargingSimulator::pause`] / [`ChargingSimulator::stop`].
//! Every ticker carries a generation number so ticks that were already queued
//! when a ticker was cancelled are discarded.

use crate::config::ChargingConfig;
use crate::logging::{StructuredLogger, get_logger};
use crate::session::{ChargingSession, Tariff};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

/// Fixed parameters of a simulated charge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorParams {
    pub max_battery_percent: f64,
    pub step_percent: f64,
    pub tick_interval: Duration,
    pub tariff: Tariff,
}

impl From<&ChargingConfig> for SimulatorParams {
    fn from(cfg: &ChargingConfig) -> Self {
        Self {
            max_battery_percent: cfg.max_battery_percent,
            step_percent: cfg.charging_speed_percent_per_tick,
            tick_interval: Duration::from_millis(cfg.tick_interval_ms),
            tariff: Tariff::new(cfg.battery_capacity_kwh, cfg.rate_per_kwh),
        }
    }
}

/// Lifecycle of the simulator within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulatorState {
    /// No ticker has been started for this session
    Idle,
    Running,
    /// Ticker cancelled, accrued values kept
    Paused,
    /// Ticking stopped for the rest of the session
    Completed,
}

/// One tick emitted by the periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Result of applying a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Battery advanced and is still below the maximum
    Progress,
    /// Battery reached the maximum with this tick; the ticker has stopped
    Completed,
    /// Stale or post-completion tick, nothing changed
    Ignored,
}

/// Handle on the spawned periodic task; aborts it when dropped
struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn<F>(generation: u64, period: Duration, mut emit: F) -> Self
    where
        F: FnMut(Tick) -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !emit(Tick { generation }) {
                    // Receiver gone; nobody is listening for this session anymore
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Time-driven battery, energy and cost accrual for one charging session
pub struct ChargingSimulator {
    params: SimulatorParams,
    session: ChargingSession,
    state: SimulatorState,
    started: Option<Instant>,
    /// Set by `stop`; freezes the elapsed clock
    finished: Option<Instant>,
    ticker: Option<Ticker>,
    generation: u64,
    /// Accrual steps applied this session; the battery level is derived from it
    ticks: u32,
    logger: StructuredLogger,
}

impl ChargingSimulator {
    pub fn new(params: SimulatorParams) -> Self {
        Self {
            params,
            session: ChargingSession::new(),
            state: SimulatorState::Idle,
            started: None,
            finished: None,
            ticker: None,
            generation: 0,
            ticks: 0,
            logger: get_logger("simulator"),
        }
    }

    pub const fn params(&self) -> &SimulatorParams {
        &self.params
    }

    pub const fn state(&self) -> SimulatorState {
        self.state
    }

    pub const fn session(&self) -> &ChargingSession {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut ChargingSession {
        &mut self.session
    }

    pub const fn is_running(&self) -> bool {
        matches!(self.state, SimulatorState::Running)
    }

    /// Battery is at the configured maximum
    pub fn is_full(&self) -> bool {
        self.session.battery_percent() >= self.params.max_battery_percent
    }

    /// Zero the counters and start the elapsed clock for a new charge
    pub fn begin_session(&mut self, now: DateTime<Utc>) {
        self.cancel_ticker();
        self.session.begin(now);
        self.ticks = 0;
        self.started = Some(Instant::now());
        self.finished = None;
        self.state = SimulatorState::Idle;
        self.logger.info(&format!(
            "Charging session {} initialised",
            self.session.session_token.as_deref().unwrap_or("-")
        ));
    }

    /// Start the periodic ticker. `emit` delivers each tick to the owner and
    /// returns false once the owner has gone away.
    pub fn start<F>(&mut self, emit: F) -> bool
    where
        F: FnMut(Tick) -> bool + Send + 'static,
    {
        if self.state != SimulatorState::Idle {
            self.logger
                .debug(&format!("Ignoring start while {:?}", self.state));
            return false;
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        self.spawn_ticker(emit);
        self.logger.info("Charging simulation started");
        true
    }

    /// Apply a tick delivered by the ticker
    pub fn on_tick(&mut self, tick: Tick) -> TickOutcome {
        if tick.generation != self.generation || self.state != SimulatorState::Running {
            return TickOutcome::Ignored;
        }
        self.advance()
    }

    /// One accrual step, clamped to the maximum. Reaching the maximum stops
    /// the ticker and reports completion exactly once.
    pub fn advance(&mut self) -> TickOutcome {
        if self.state == SimulatorState::Completed {
            return TickOutcome::Ignored;
        }

        // Multiplying instead of summing keeps step N exact for steps such as 0.1
        self.ticks = self.ticks.saturating_add(1);
        let next = (f64::from(self.ticks) * self.params.step_percent)
            .min(self.params.max_battery_percent);
        self.session.set_battery_percent(next, &self.params.tariff);
        self.logger.trace(&format!(
            "Battery {:.1}% energy {:.2} kWh cost {:.2}",
            next,
            self.session.energy_consumed_kwh(),
            self.session.total_cost()
        ));

        if self.is_full() {
            self.stop();
            return TickOutcome::Completed;
        }
        TickOutcome::Progress
    }

    /// Halt ticking, keeping every accrued value
    pub fn pause(&mut self) -> bool {
        if self.state != SimulatorState::Running {
            return false;
        }
        self.cancel_ticker();
        self.state = SimulatorState::Paused;
        self.logger.info(&format!(
            "Charging paused at {:.1}%",
            self.session.battery_percent()
        ));
        true
    }

    /// Restart ticking from the current level if the battery is not full
    pub fn resume<F>(&mut self, emit: F) -> bool
    where
        F: FnMut(Tick) -> bool + Send + 'static,
    {
        if self.state != SimulatorState::Paused || self.is_full() {
            return false;
        }
        self.spawn_ticker(emit);
        self.logger.info(&format!(
            "Charging resumed at {:.1}%",
            self.session.battery_percent()
        ));
        true
    }

    /// Stop ticking for the rest of the session. Returns whether the battery
    /// reached the maximum, i.e. whether the session is ready for payment.
    pub fn stop(&mut self) -> bool {
        self.cancel_ticker();
        if self.state != SimulatorState::Completed {
            self.state = SimulatorState::Completed;
            self.finished = Some(Instant::now());
            self.logger.info(&format!(
                "Charging stopped at {:.1}%",
                self.session.battery_percent()
            ));
        }
        self.is_full()
    }

    /// Clear the session completely, token included
    pub fn reset(&mut self) {
        self.cancel_ticker();
        self.session.reset();
        self.ticks = 0;
        self.started = None;
        self.finished = None;
        self.state = SimulatorState::Idle;
    }

    /// Wall-clock time since the session began, up to `stop`. Pauses are
    /// not subtracted.
    pub fn elapsed(&self) -> Duration {
        let Some(started) = self.started else {
            return Duration::ZERO;
        };
        self.finished
            .map_or_else(|| started.elapsed(), |end| end.duration_since(started))
    }

    fn spawn_ticker<F>(&mut self, emit: F)
    where
        F: FnMut(Tick) -> bool + Send + 'static,
    {
        self.cancel_ticker();
        self.ticker = Some(Ticker::spawn(
            self.generation,
            self.params.tick_interval,
            emit,
        ));
        self.state = SimulatorState::Running;
    }

    fn cancel_ticker(&mut self) {
        if self.ticker.take().is_some() {
            // Ticks already queued by the old ticker no longer match
            self.generation = self.generation.wrapping_add(1);
        }
    }
}

/// `MM:SS` for the charging and receipt screens
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn params() -> SimulatorParams {
        SimulatorParams {
            max_battery_percent: 100.0,
            step_percent: 2.0,
            tick_interval: Duration::from_millis(1000),
            tariff: Tariff::new(50.0, 12.0),
        }
    }

    #[test]
    fn advance_clamps_and_completes_once() {
        let mut sim = ChargingSimulator::new(SimulatorParams {
            step_percent: 30.0,
            ..params()
        });
        assert_eq!(sim.advance(), TickOutcome::Progress);
        assert_eq!(sim.advance(), TickOutcome::Progress);
        assert_eq!(sim.advance(), TickOutcome::Progress);
        assert_eq!(sim.advance(), TickOutcome::Completed);
        assert_eq!(sim.session().battery_percent(), 100.0);
        assert_eq!(sim.advance(), TickOutcome::Ignored);
        assert_eq!(sim.session().battery_percent(), 100.0);
        assert_eq!(sim.state(), SimulatorState::Completed);
    }

    #[test]
    fn fractional_step_matches_tick_count() {
        let mut sim = ChargingSimulator::new(SimulatorParams {
            step_percent: 0.1,
            ..params()
        });
        let mut completed_at = None;
        for n in 1..=1001u32 {
            let outcome = sim.advance();
            if n <= 1000 {
                let expected = (f64::from(n) * 0.1).min(100.0);
                assert_eq!(sim.session().battery_percent(), expected, "tick {n}");
            }
            if outcome == TickOutcome::Completed {
                assert!(completed_at.is_none());
                completed_at = Some(n);
            }
        }
        assert_eq!(completed_at, Some(1000));
        assert_eq!(sim.session().battery_percent(), 100.0);
    }

    #[test]
    fn format_elapsed_pads() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "01:05");
        assert_eq!(format_elapsed(Duration::from_secs(3600)), "60:00");
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_drives_accrual() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sim = ChargingSimulator::new(params());
        sim.begin_session(Utc::now());
        assert!(sim.start(move |t| tx.send(t).is_ok()));

        let mut outcome = TickOutcome::Progress;
        let mut ticks = 0;
        while outcome != TickOutcome::Completed {
            let tick = rx.recv().await.unwrap();
            outcome = sim.on_tick(tick);
            ticks += 1;
        }
        assert_eq!(ticks, 50);
        assert_eq!(sim.session().energy_consumed_kwh(), 50.0);
        assert_eq!(sim.session().total_cost(), 600.0);
        assert_eq!(sim.elapsed(), Duration::from_secs(50));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticks_after_pause_are_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sim = ChargingSimulator::new(params());
        sim.begin_session(Utc::now());
        let tx_resume = tx.clone();
        sim.start(move |t| tx.send(t).is_ok());

        let first = rx.recv().await.unwrap();
        assert_eq!(sim.on_tick(first), TickOutcome::Progress);
        assert!(sim.pause());
        // A tick emitted before the pause but delivered after it
        assert_eq!(sim.on_tick(first), TickOutcome::Ignored);
        assert_eq!(sim.session().battery_percent(), 2.0);

        assert!(sim.resume(move |t| tx_resume.send(t).is_ok()));
        let next = rx.recv().await.unwrap();
        assert_ne!(next.generation, first.generation);
        assert_eq!(sim.on_tick(next), TickOutcome::Progress);
        assert_eq!(sim.session().battery_percent(), 4.0);
    }
}
