use safrasphere::config::Config;
use safrasphere::session::Tariff;
use safrasphere::simulator::{
    ChargingSimulator, SimulatorParams, SimulatorState, TickOutcome, format_elapsed,
};
use std::time::Duration;
use tokio::sync::mpsc;

fn default_simulator() -> ChargingSimulator {
    ChargingSimulator::new(SimulatorParams::from(&Config::default().charging))
}

#[tokio::test(start_paused = true)]
async fn full_charge_takes_fifty_ticks() {
    let mut sim = default_simulator();
    sim.begin_session(chrono::Utc::now());

    let (tx, mut rx) = mpsc::unbounded_channel();
    assert!(sim.start(move |tick| tx.send(tick).is_ok()));
    assert!(sim.is_running());

    let mut ticks = 0;
    loop {
        let tick = rx.recv().await.unwrap();
        ticks += 1;
        match sim.on_tick(tick) {
            TickOutcome::Progress => {}
            TickOutcome::Completed => break,
            TickOutcome::Ignored => panic!("live tick ignored"),
        }
    }

    assert_eq!(ticks, 50);
    assert_eq!(sim.state(), SimulatorState::Completed);
    assert_eq!(sim.session().battery_percent(), 100.0);
    assert!((sim.session().energy_consumed_kwh() - 50.0).abs() < 1e-9);
    assert!((sim.session().total_cost() - 600.0).abs() < 1e-9);
    assert_eq!(format_elapsed(sim.elapsed()), "00:50");
}

#[tokio::test(start_paused = true)]
async fn cost_always_follows_energy() {
    let mut sim = ChargingSimulator::new(SimulatorParams {
        max_battery_percent: 80.0,
        step_percent: 7.5,
        tick_interval: Duration::from_millis(10),
        tariff: Tariff::new(40.0, 9.5),
    });
    sim.begin_session(chrono::Utc::now());

    loop {
        let outcome = sim.advance();
        let session = sim.session();
        assert!(session.battery_percent() <= 80.0);
        assert!((session.energy_consumed_kwh() - session.battery_percent() / 100.0 * 40.0).abs() < 1e-9);
        assert!((session.total_cost() - session.energy_consumed_kwh() * 9.5).abs() < 1e-9);
        if outcome == TickOutcome::Completed {
            break;
        }
    }
    assert_eq!(sim.session().battery_percent(), 80.0);
}

#[tokio::test(start_paused = true)]
async fn paused_simulator_ignores_stale_ticks() {
    let mut sim = default_simulator();
    sim.begin_session(chrono::Utc::now());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let resume_tx = tx.clone();
    sim.start(move |tick| tx.send(tick).is_ok());

    let first = rx.recv().await.unwrap();
    assert!(sim.pause());
    assert_eq!(sim.on_tick(first), TickOutcome::Ignored);
    assert_eq!(sim.session().battery_percent(), 0.0);

    assert!(sim.resume(move |tick| resume_tx.send(tick).is_ok()));
    // The tick from before the pause belongs to an older ticker
    assert_eq!(sim.on_tick(first), TickOutcome::Ignored);
    let fresh = rx.recv().await.unwrap();
    assert_eq!(sim.on_tick(fresh), TickOutcome::Progress);
    assert_eq!(sim.session().battery_percent(), 2.0);
}

#[tokio::test(start_paused = true)]
async fn stop_freezes_elapsed_and_reset_clears_session() {
    let mut sim = default_simulator();
    sim.session_mut().assign_token("CST_1_abcdefghi".to_string()).unwrap();
    sim.begin_session(chrono::Utc::now());
    tokio::time::advance(Duration::from_secs(5)).await;
    sim.stop();
    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(sim.elapsed(), Duration::from_secs(5));

    sim.reset();
    assert_eq!(sim.state(), SimulatorState::Idle);
    assert!(sim.session().session_token.is_none());
    assert_eq!(sim.elapsed(), Duration::ZERO);
}
