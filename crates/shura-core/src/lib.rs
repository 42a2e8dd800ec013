#![forbid(unsafe_code)]

//! Core: domain types, the pure overlay-session state machine, and the
//! dependent-toggle transition layer.
//!
//! # Role in Shura
//! `shura-core` holds everything that is pure: no clocks, no threads, no
//! storage. The [`SessionMachine`] consumes events and emits [`Effect`]s;
//! the [`toggle`] module exposes `ToggleState` with validating transitions.
//! Drivers that own real timers and persistence live in `shura-runtime`.

pub mod outcome;
pub mod rng;
pub mod session;
pub mod toggle;

pub use outcome::{Outcome, SessionError, SessionStatus};
pub use rng::{RandomSource, ScriptedRandom, ThreadRandom};
pub use session::{Effect, SessionMachine, TimerToken};
pub use toggle::{ToggleError, ToggleState};
