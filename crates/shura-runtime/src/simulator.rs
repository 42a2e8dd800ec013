#![forbid(unsafe_code)]

//! Deterministic session harness for tests and scripted playback.
//!
//! `SessionSimulator` runs an [`OverlaySession`] on a virtual clock with a
//! scripted random source: no real timers, no nondeterminism. Time moves
//! only through [`advance`](SessionSimulator::advance), which delivers due
//! timers at their exact deadlines and records each close with its virtual
//! timestamp.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use shura_core::outcome::Outcome;
//! use shura_core::rng::ScriptedRandom;
//! use shura_runtime::simulator::SessionSimulator;
//!
//! let mut sim = SessionSimulator::open("Aria", ScriptedRandom::always_success());
//! sim.advance(Duration::from_millis(1000));
//! sim.request_stop().unwrap();
//! sim.advance(Duration::from_millis(3000));
//! assert_eq!(sim.outcome(), Some(Outcome::Stopped));
//! assert_eq!(sim.closes()[0].at, Duration::from_millis(4000));
//! ```

use std::sync::mpsc;
use std::time::Duration;

use shura_core::outcome::{Outcome, SessionError, SessionStatus};
use shura_core::rng::RandomSource;

use crate::overlay::OverlaySession;
use crate::timer::ManualTimers;

/// One recorded close notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseRecord {
    /// Virtual time at which the close was delivered.
    pub at: Duration,
    /// The delivered outcome.
    pub outcome: Outcome,
}

/// Deterministic simulator for one overlay session.
pub struct SessionSimulator {
    session: OverlaySession<ManualTimers>,
    close_rx: mpsc::Receiver<Outcome>,
    closes: Vec<CloseRecord>,
}

impl SessionSimulator {
    /// Open a session for `subject` with the given random source.
    ///
    /// The virtual clock starts at zero; the auto-timeout is pending.
    #[must_use]
    pub fn open(subject: impl Into<String>, rng: impl RandomSource + Send + 'static) -> Self {
        let (close_tx, close_rx) = mpsc::channel();
        let session = OverlaySession::open(
            subject,
            ManualTimers::new(),
            Box::new(rng),
            move |outcome| {
                let _ = close_tx.send(outcome);
            },
        );
        Self {
            session,
            close_rx,
            closes: Vec::new(),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.session.timers().now()
    }

    /// Current session status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Terminal outcome, once closed.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.session.outcome()
    }

    /// Close notifications recorded so far, in delivery order.
    #[must_use]
    pub fn closes(&self) -> &[CloseRecord] {
        &self.closes
    }

    /// Forward a stop intent at the current virtual time.
    pub fn request_stop(&mut self) -> Result<(), SessionError> {
        self.session.request_stop()
    }

    /// Advance the virtual clock by `dt`.
    ///
    /// Due timers are delivered in deadline order, each at its own
    /// deadline, so effects scheduled by a firing are anchored at the
    /// firing instant rather than at the end of the advance.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.now() + dt;
        while let Some(token) = self.session.timers_mut().fire_next(target) {
            self.session.deliver_timer(token);
            let at = self.session.timers().now();
            while let Ok(outcome) = self.close_rx.try_recv() {
                self.closes.push(CloseRecord { at, outcome });
            }
        }
        self.session.timers_mut().advance_clock(target);
    }

    /// Advance until the session closes or `limit` elapses.
    ///
    /// Returns the outcome if a close happened within the limit.
    pub fn run_until_closed(&mut self, limit: Duration) -> Option<Outcome> {
        self.advance(limit);
        self.session.outcome()
    }
}

impl std::fmt::Debug for SessionSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSimulator")
            .field("now", &self.now())
            .field("status", &self.status())
            .field("closes", &self.closes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use shura_core::rng::ScriptedRandom;

    use super::*;

    #[test]
    fn simulator_starts_at_zero_in_viewing() {
        let sim = SessionSimulator::open("aria", ScriptedRandom::always_success());
        assert_eq!(sim.now(), Duration::ZERO);
        assert_eq!(sim.status(), SessionStatus::Viewing);
        assert!(sim.closes().is_empty());
    }

    #[test]
    fn advance_moves_the_clock_even_without_firings() {
        let mut sim = SessionSimulator::open("aria", ScriptedRandom::always_success());
        sim.advance(Duration::from_millis(500));
        assert_eq!(sim.now(), Duration::from_millis(500));
        assert_eq!(sim.status(), SessionStatus::Viewing);
    }

    #[test]
    fn close_records_carry_the_deadline_timestamp() {
        let mut sim = SessionSimulator::open("aria", ScriptedRandom::always_success());
        // Overshooting the deadline still records the close at 8000 ms.
        sim.advance(Duration::from_secs(60));
        assert_eq!(
            sim.closes(),
            &[CloseRecord {
                at: Duration::from_millis(8000),
                outcome: Outcome::Allowed,
            }]
        );
        assert_eq!(sim.now(), Duration::from_secs(60));
    }

    #[test]
    fn run_until_closed_reports_the_outcome() {
        let mut sim = SessionSimulator::open("aria", ScriptedRandom::always_failure());
        sim.request_stop().unwrap();
        let outcome = sim.run_until_closed(Duration::from_secs(10));
        assert_eq!(outcome, Some(Outcome::FailedToStop));
    }
}
