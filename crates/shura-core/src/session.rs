#![forbid(unsafe_code)]

//! Pure overlay-session state machine.
//!
//! The machine performs no I/O and holds no clock. It consumes stop
//! requests and elapsed-timer tokens, and emits [`Effect`]s for the driver
//! to execute: schedule a timer, cancel a timer, or deliver the terminal
//! outcome. A session holds at most one pending timer at any instant, and
//! every transition that leaves a state cancels that state's timer.
//!
//! # Transition table
//!
//! | From | Trigger | To | Timing |
//! |---|---|---|---|
//! | Viewing | auto-timeout | Closed(Allowed) | 8000 ms |
//! | Viewing | stop request | Stopping | immediate, cancels auto-timeout |
//! | Stopping | resolution timer | Succeeded / Failed | 1500 ms |
//! | Succeeded | settle timer | Closed(Stopped) | 1500 ms |
//! | Failed | settle timer | Closed(FailedToStop) | 2000 ms |
//!
//! The Succeeded/Failed branch is drawn from the injected [`RandomSource`]
//! on entry to Stopping: one uniform value, success iff it falls below 0.5.
//!
//! Timer identity is carried by [`TimerToken`], so a token from a state the
//! session has already left is rejected here as well. Cancellation is the
//! primary discipline; the token check is the backstop for the inherent
//! race where a timer fires before its cancellation lands.

use std::time::Duration;

use crate::outcome::{Outcome, SessionError, SessionStatus};
use crate::rng::RandomSource;

/// Viewing window before the session resolves unopposed.
pub const AUTO_TIMEOUT: Duration = Duration::from_millis(8000);
/// Delay between an accepted stop request and its resolution.
pub const RESOLUTION_DELAY: Duration = Duration::from_millis(1500);
/// Settle delay after a successful stop, before close.
pub const SETTLE_SUCCESS_DELAY: Duration = Duration::from_millis(1500);
/// Settle delay after a failed stop, before close.
pub const SETTLE_FAILURE_DELAY: Duration = Duration::from_millis(2000);

/// Identity of a scheduled timer, one per state that owns a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerToken {
    /// The Viewing auto-timeout.
    AutoTimeout,
    /// The Stopping resolution deadline.
    Resolution,
    /// The Succeeded settle deadline.
    SettleSuccess,
    /// The Failed settle deadline.
    SettleFailure,
}

/// Side effect requested by a transition, executed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Schedule `token` to elapse after the delay.
    Schedule(TimerToken, Duration),
    /// Cancel the pending timer identified by `token`.
    Cancel(TimerToken),
    /// Deliver the terminal outcome. Emitted exactly once per session.
    Close(Outcome),
}

/// One run of the timed intrusion interaction, open to terminal outcome.
///
/// Sessions are one-shot: a closed machine never transitions again, and a
/// new interaction is a new machine.
#[derive(Debug)]
pub struct SessionMachine {
    subject: String,
    status: SessionStatus,
    outcome: Option<Outcome>,
    /// Resolution branch, drawn once on entry to Stopping.
    will_succeed: Option<bool>,
}

impl SessionMachine {
    /// Open a session for `subject`, entering Viewing.
    ///
    /// The returned effect schedules the auto-timeout; the driver must
    /// execute it before yielding control.
    #[must_use]
    pub fn open(subject: impl Into<String>) -> (Self, Effect) {
        let machine = Self {
            subject: subject.into(),
            status: SessionStatus::Viewing,
            outcome: None,
            will_succeed: None,
        };
        (
            machine,
            Effect::Schedule(TimerToken::AutoTimeout, AUTO_TIMEOUT),
        )
    }

    /// Display identifier of the simulated intruder. Opaque to the core.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Terminal outcome; `Some` exactly when the status is `Closed`.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Handle a stop request.
    ///
    /// Accepted only in Viewing: cancels the auto-timeout, draws the
    /// resolution branch from `rng`, and schedules the resolution timer.
    /// In any other status the request is rejected as
    /// [`SessionError::InvalidState`] and nothing changes, so a stop can
    /// never be accepted twice.
    pub fn request_stop(
        &mut self,
        rng: &mut dyn RandomSource,
    ) -> Result<[Effect; 2], SessionError> {
        match self.status {
            SessionStatus::Viewing => {
                self.status = SessionStatus::Stopping;
                self.will_succeed = Some(rng.next_unit() < 0.5);
                Ok([
                    Effect::Cancel(TimerToken::AutoTimeout),
                    Effect::Schedule(TimerToken::Resolution, RESOLUTION_DELAY),
                ])
            }
            status => Err(SessionError::InvalidState { status }),
        }
    }

    /// Handle an elapsed timer.
    ///
    /// A token that does not belong to the current status is stale (its
    /// cancellation raced with its firing) and produces no effects.
    pub fn timer_elapsed(&mut self, token: TimerToken) -> Option<Effect> {
        match (self.status, token) {
            (SessionStatus::Viewing, TimerToken::AutoTimeout) => {
                Some(self.close(Outcome::Allowed))
            }
            (SessionStatus::Stopping, TimerToken::Resolution) => {
                if self.will_succeed == Some(true) {
                    self.status = SessionStatus::Succeeded;
                    Some(Effect::Schedule(
                        TimerToken::SettleSuccess,
                        SETTLE_SUCCESS_DELAY,
                    ))
                } else {
                    self.status = SessionStatus::Failed;
                    Some(Effect::Schedule(
                        TimerToken::SettleFailure,
                        SETTLE_FAILURE_DELAY,
                    ))
                }
            }
            (SessionStatus::Succeeded, TimerToken::SettleSuccess) => {
                Some(self.close(Outcome::Stopped))
            }
            (SessionStatus::Failed, TimerToken::SettleFailure) => {
                Some(self.close(Outcome::FailedToStop))
            }
            // Stale token from a state already left.
            _ => None,
        }
    }

    fn close(&mut self, outcome: Outcome) -> Effect {
        self.status = SessionStatus::Closed;
        self.outcome = Some(outcome);
        Effect::Close(outcome)
    }
}
