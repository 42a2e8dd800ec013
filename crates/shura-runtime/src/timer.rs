#![forbid(unsafe_code)]

//! Timer scheduling with explicit cancellation.
//!
//! A session holds at most one pending timer, identified by its
//! [`TimerToken`]. The [`TimerService`] port covers scheduling and
//! cancellation; delivery is pulled by the owner, never pushed, so all
//! machine transitions stay on the owner's execution context.
//!
//! Two implementations:
//!
//! - [`ManualTimers`]: a virtual clock for tests and scripted playback.
//!   Firing advances the clock to each deadline in turn, so effects
//!   scheduled from a firing are anchored at the firing instant.
//! - [`ThreadTimers`]: a single background thread parked on a condition
//!   variable. Elapsed tokens cross back over an mpsc channel; the owner
//!   drains them and feeds the session. Cancellation while the worker
//!   holds the deadline is resolved under the lock, so a cancelled timer
//!   never reaches the channel. The one unavoidable race (fired before
//!   the cancel arrived) is absorbed by the machine's stale-token check.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use shura_core::session::TimerToken;

/// Port for scheduling and cancelling the session's pending timer.
pub trait TimerService {
    /// Schedule `token` to elapse after `delay`, replacing any pending
    /// timer.
    fn schedule(&mut self, token: TimerToken, delay: Duration);

    /// Cancel the pending timer if it carries `token`; otherwise no-op.
    fn cancel(&mut self, token: TimerToken);
}

// ─────────────────────────────────────────────────────────────────────────
// Manual timers (virtual clock)
// ─────────────────────────────────────────────────────────────────────────

/// Deterministic timer service driven by a virtual clock.
///
/// Time only moves when the owner advances it; there is no real waiting.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    pending: Vec<(Duration, TimerToken)>,
}

impl ManualTimers {
    /// Create a service with the clock at zero and nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|(due, _)| *due).min()
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Fire the earliest timer due at or before `limit`, moving the clock
    /// to its deadline. Returns `None` (clock untouched) when nothing is
    /// due by then. Equal deadlines fire in scheduling order.
    pub fn fire_next(&mut self, limit: Duration) -> Option<TimerToken> {
        let mut earliest: Option<(usize, Duration)> = None;
        for (index, (due, _)) in self.pending.iter().enumerate() {
            // Strict comparison keeps the first-scheduled of equal deadlines.
            if *due <= limit && earliest.is_none_or(|(_, best)| *due < best) {
                earliest = Some((index, *due));
            }
        }
        let (index, due) = earliest?;
        let (_, token) = self.pending.remove(index);
        self.now = self.now.max(due);
        Some(token)
    }

    /// Move the clock forward to `target`. No-op if already past.
    pub fn advance_clock(&mut self, target: Duration) {
        self.now = self.now.max(target);
    }
}

impl TimerService for ManualTimers {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        self.pending.push((self.now + delay, token));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|(_, t)| *t != token);
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Thread timers (real clock)
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Pending {
    token: TimerToken,
    deadline: Instant,
}

#[derive(Debug, Default)]
struct WorkerState {
    pending: Option<Pending>,
    /// Set under the lock so the store and the notification cannot slip
    /// into the window between the worker's check and its wait.
    shutdown: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<WorkerState>,
    cvar: Condvar,
}

/// Real timer service backed by a single background thread.
///
/// The worker parks on a condition variable until a deadline is set, then
/// waits out the deadline. Elapsed tokens are sent over a channel and
/// drained by the owner via [`drain_elapsed`](Self::drain_elapsed) or
/// [`wait_elapsed`](Self::wait_elapsed). Dropping the service stops the
/// worker.
#[derive(Debug)]
pub struct ThreadTimers {
    shared: Arc<Shared>,
    elapsed: mpsc::Receiver<TimerToken>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ThreadTimers {
    /// Spawn the worker thread.
    pub fn spawn() -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(WorkerState::default()),
            cvar: Condvar::new(),
        });
        let (tx, rx) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("shura-timer".into())
            .spawn(move || run_worker(&worker_shared, &tx))?;
        Ok(Self {
            shared,
            elapsed: rx,
            worker: Some(worker),
        })
    }

    /// Drain tokens that elapsed since the last call, oldest first.
    pub fn drain_elapsed(&mut self) -> Vec<TimerToken> {
        let mut tokens = Vec::new();
        while let Ok(token) = self.elapsed.try_recv() {
            tokens.push(token);
        }
        tokens
    }

    /// Block until a token elapses or `timeout` passes.
    pub fn wait_elapsed(&mut self, timeout: Duration) -> Option<TimerToken> {
        self.elapsed.recv_timeout(timeout).ok()
    }
}

fn run_worker(shared: &Shared, tx: &mpsc::Sender<TimerToken>) {
    let mut state = match shared.state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    loop {
        if state.shutdown {
            return;
        }
        match state.pending {
            None => {
                state = match shared.cvar.wait(state) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
            }
            Some(Pending { token, deadline }) => {
                let now = Instant::now();
                if now >= deadline {
                    // Still pending under the lock, so no cancel or
                    // replacement won; fire it.
                    state.pending = None;
                    if tx.send(token).is_err() {
                        return;
                    }
                } else {
                    // Re-inspect after waking: the pending slot may have
                    // been cancelled or replaced while we slept.
                    state = match shared.cvar.wait_timeout(state, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                }
            }
        }
    }
}

impl TimerService for ThreadTimers {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        let mut state = match self.shared.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.pending = Some(Pending {
            token,
            deadline: Instant::now() + delay,
        });
        drop(state);
        self.shared.cvar.notify_one();
    }

    fn cancel(&mut self, token: TimerToken) {
        let mut state = match self.shared.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.pending.map(|p| p.token) == Some(token) {
            state.pending = None;
        }
        drop(state);
        self.shared.cvar.notify_one();
    }
}

impl Drop for ThreadTimers {
    fn drop(&mut self) {
        {
            let mut state = match self.shared.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            state.shutdown = true;
        }
        self.shared.cvar.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
