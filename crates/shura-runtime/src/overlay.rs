#![forbid(unsafe_code)]

//! Overlay session driver.
//!
//! [`OverlaySession`] wires the pure [`SessionMachine`] to a timer
//! service, a random source, and a one-shot close callback. It executes
//! the machine's effects in order, so cancellations land before new
//! deadlines and the close notification is delivered exactly once.
//!
//! Delivery of elapsed timers is pulled: the owner drains its timer
//! service and calls [`deliver_timer`](OverlaySession::deliver_timer) on
//! its own execution context. Nothing here spawns or shares state.

use shura_core::outcome::{Outcome, SessionError, SessionStatus};
use shura_core::rng::RandomSource;
use shura_core::session::{Effect, SessionMachine, TimerToken};

use crate::timer::TimerService;

/// One-shot notification carrying the terminal outcome.
pub type CloseCallback = Box<dyn FnOnce(Outcome) + Send>;

/// Drives one intrusion interaction from open to terminal outcome.
///
/// One-shot: once closed, the session only answers status queries. A new
/// interaction is a new session.
pub struct OverlaySession<T: TimerService> {
    machine: SessionMachine,
    timers: T,
    rng: Box<dyn RandomSource + Send>,
    on_close: Option<CloseCallback>,
}

impl<T: TimerService> OverlaySession<T> {
    /// Open a session for `subject` and start the viewing window.
    ///
    /// The auto-timeout is scheduled before this returns.
    pub fn open(
        subject: impl Into<String>,
        timers: T,
        rng: Box<dyn RandomSource + Send>,
        on_close: impl FnOnce(Outcome) + Send + 'static,
    ) -> Self {
        let (machine, effect) = SessionMachine::open(subject);
        let mut session = Self {
            machine,
            timers,
            rng,
            on_close: Some(Box::new(on_close)),
        };
        session.apply(effect);
        session
    }

    /// Display identifier of the simulated intruder.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.machine.subject()
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.machine.status()
    }

    /// Terminal outcome; `Some` exactly when closed.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.machine.outcome()
    }

    /// Whether the session reached its terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.machine.status().is_closed()
    }

    /// Shared access to the timer service.
    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Exclusive access to the timer service, for draining elapsed tokens.
    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Forward a stop intent from the presentation layer.
    ///
    /// Outside `Viewing` this is a benign no-op reported as
    /// [`SessionError::InvalidState`]; callers may log it and move on.
    pub fn request_stop(&mut self) -> Result<(), SessionError> {
        let effects = self.machine.request_stop(self.rng.as_mut())?;
        tracing::debug!(subject = self.machine.subject(), "stop requested");
        for effect in effects {
            self.apply(effect);
        }
        Ok(())
    }

    /// Deliver an elapsed timer token drained from the timer service.
    ///
    /// Stale tokens are ignored by the machine.
    pub fn deliver_timer(&mut self, token: TimerToken) {
        if let Some(effect) = self.machine.timer_elapsed(token) {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Schedule(token, delay) => self.timers.schedule(token, delay),
            Effect::Cancel(token) => self.timers.cancel(token),
            Effect::Close(outcome) => {
                tracing::debug!(
                    subject = self.machine.subject(),
                    outcome = %outcome,
                    "session closed"
                );
                if let Some(callback) = self.on_close.take() {
                    callback(outcome);
                }
            }
        }
    }
}

impl<T: TimerService> std::fmt::Debug for OverlaySession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySession")
            .field("subject", &self.machine.subject())
            .field("status", &self.machine.status())
            .field("outcome", &self.machine.outcome())
            .finish()
    }
}

/// At-most-one-active-session slot for a presentation handle.
///
/// `open` fails while an unclosed session is present; a closed session is
/// displaced by the next open (or reclaimed via
/// [`take_closed`](Self::take_closed)).
#[derive(Debug, Default)]
pub struct OverlayHost<T: TimerService> {
    active: Option<OverlaySession<T>>,
}

impl<T: TimerService> OverlayHost<T> {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Open a session if none is active.
    pub fn open(
        &mut self,
        subject: impl Into<String>,
        timers: T,
        rng: Box<dyn RandomSource + Send>,
        on_close: impl FnOnce(Outcome) + Send + 'static,
    ) -> Result<&mut OverlaySession<T>, SessionError> {
        if let Some(session) = &self.active {
            if !session.is_closed() {
                return Err(SessionError::AlreadyOpen {
                    status: session.status(),
                });
            }
        }
        Ok(self
            .active
            .insert(OverlaySession::open(subject, timers, rng, on_close)))
    }

    /// The active session, if any.
    pub fn session(&mut self) -> Option<&mut OverlaySession<T>> {
        self.active.as_mut()
    }

    /// Remove and return the session once it has closed.
    pub fn take_closed(&mut self) -> Option<OverlaySession<T>> {
        if self.active.as_ref().is_some_and(OverlaySession::is_closed) {
            self.active.take()
        } else {
            None
        }
    }
}
