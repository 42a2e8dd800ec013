#![forbid(unsafe_code)]

//! Shura Runtime
//!
//! This crate provides the drivers that tie the pure core to real
//! resources: timers, randomness, persistence, and the close notification.
//!
//! # Key Components
//!
//! - [`OverlaySession`] - Drives one intrusion interaction over a timer
//!   service and delivers the terminal outcome exactly once
//! - [`OverlayHost`] - At-most-one-active-session slot for a handle
//! - [`TimerService`] - Port for scheduling and cancelling timers
//! - [`ManualTimers`] / [`ThreadTimers`] - Deterministic and real impls
//! - [`SettingsStore`] - Key-value persistence port with memory and file
//!   backends
//! - [`ToggleGovernor`] - Invariant-enforcing owner of the two settings
//! - [`SessionSimulator`] - Virtual-clock harness for scripted playback
//!
//! # Role in Shura
//! `shura-runtime` is the orchestrator. It executes the effects emitted by
//! `shura-core`'s state machine, owns the single pending timer per
//! session, and round-trips toggle state through a [`SettingsStore`].

pub mod governor;
pub mod overlay;
pub mod settings_store;
pub mod simulator;
pub mod timer;

pub use governor::{Applied, ToggleGovernor};
pub use overlay::{OverlayHost, OverlaySession};
pub use settings_store::{MemoryStore, SettingsStore, StoreError, StoreResult};
pub use simulator::SessionSimulator;
pub use timer::{ManualTimers, ThreadTimers, TimerService};

#[cfg(feature = "file-store")]
pub use settings_store::FileStore;
