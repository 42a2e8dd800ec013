//! End-to-end timing tests for the overlay session, on the virtual clock.
//!
//! Timings under test: 8000 ms viewing window, 1500 ms resolution delay,
//! 1500 ms settle after success, 2000 ms settle after failure.

use std::time::Duration;

use shura_core::outcome::{Outcome, SessionStatus};
use shura_core::rng::ScriptedRandom;
use shura_runtime::simulator::{CloseRecord, SessionSimulator};

const MS: fn(u64) -> Duration = Duration::from_millis;

#[test]
fn untouched_session_closes_allowed_at_8000ms() {
    let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    sim.advance(MS(7999));
    assert_eq!(sim.status(), SessionStatus::Viewing);
    assert!(sim.closes().is_empty());

    sim.advance(MS(1));
    assert_eq!(
        sim.closes(),
        &[CloseRecord {
            at: MS(8000),
            outcome: Outcome::Allowed,
        }]
    );
}

#[test]
fn close_fires_exactly_once_no_matter_how_far_time_runs() {
    let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    sim.advance(Duration::from_secs(600));
    assert_eq!(sim.closes().len(), 1);
    sim.advance(Duration::from_secs(600));
    assert_eq!(sim.closes().len(), 1);
}

#[test]
fn stop_at_1000ms_with_forced_success_closes_stopped_at_4000ms() {
    let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    sim.advance(MS(1000));
    sim.request_stop().unwrap();
    assert_eq!(sim.status(), SessionStatus::Stopping);

    sim.advance(MS(1499));
    assert_eq!(sim.status(), SessionStatus::Stopping);
    sim.advance(MS(1));
    assert_eq!(sim.status(), SessionStatus::Succeeded);

    sim.advance(MS(1500));
    assert_eq!(
        sim.closes(),
        &[CloseRecord {
            at: MS(4000),
            outcome: Outcome::Stopped,
        }]
    );
}

#[test]
fn stop_with_forced_failure_closes_failed_to_stop_after_3500ms() {
    let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_failure());
    sim.advance(MS(1000));
    sim.request_stop().unwrap();

    sim.advance(MS(1500));
    assert_eq!(sim.status(), SessionStatus::Failed);

    // Failure settles after 2000 ms, not 1500.
    sim.advance(MS(1999));
    assert_eq!(sim.status(), SessionStatus::Failed);
    sim.advance(MS(1));
    assert_eq!(
        sim.closes(),
        &[CloseRecord {
            at: MS(4500),
            outcome: Outcome::FailedToStop,
        }]
    );
}

#[test]
fn auto_timeout_never_fires_after_an_accepted_stop() {
    let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    sim.advance(MS(7999));
    sim.request_stop().unwrap();

    // Run far past the original 8000 ms deadline.
    sim.advance(Duration::from_secs(60));
    assert_eq!(sim.closes().len(), 1);
    assert_eq!(sim.closes()[0].outcome, Outcome::Stopped);
    // Resolution at 9499, settle at 10999.
    assert_eq!(sim.closes()[0].at, MS(10999));
}

#[test]
fn stop_request_after_close_is_a_benign_no_op() {
    let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    sim.advance(MS(8000));
    assert!(sim.request_stop().is_err());
    assert_eq!(sim.outcome(), Some(Outcome::Allowed));
}

#[test]
fn second_stop_request_is_rejected_and_changes_no_timing() {
    let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    sim.advance(MS(1000));
    sim.request_stop().unwrap();
    sim.advance(MS(500));
    assert!(sim.request_stop().is_err());

    sim.advance(Duration::from_secs(10));
    assert_eq!(sim.closes()[0].at, MS(4000));
}

#[test]
fn each_of_the_three_outcomes_is_reachable() {
    let mut allowed = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    assert_eq!(
        allowed.run_until_closed(Duration::from_secs(10)),
        Some(Outcome::Allowed)
    );

    let mut stopped = SessionSimulator::open("Aria", ScriptedRandom::always_success());
    stopped.request_stop().unwrap();
    assert_eq!(
        stopped.run_until_closed(Duration::from_secs(10)),
        Some(Outcome::Stopped)
    );

    let mut failed = SessionSimulator::open("Aria", ScriptedRandom::always_failure());
    failed.request_stop().unwrap();
    assert_eq!(
        failed.run_until_closed(Duration::from_secs(10)),
        Some(Outcome::FailedToStop)
    );
}
