#![forbid(unsafe_code)]

//! Toggle governor: invariant enforcement and settings round-trips.
//!
//! The governor owns the in-memory [`ToggleState`], applies the pure
//! transitions from `shura-core`, and persists both keys after every
//! successful mutation. Store failure is never fatal: the in-memory state
//! stays invariant-consistent and the failure is surfaced as a warning on
//! the mutation result.

use shura_core::toggle::{ToggleError, ToggleState};

use crate::settings_store::{SettingsStore, StoreError, StoreResult};

/// Persisted key for check-in enablement.
pub const CHECK_IN_KEY: &str = "check_in_enabled";
/// Persisted key for shura-mode enablement.
pub const SHURA_MODE_KEY: &str = "shura_mode_enabled";

fn flag_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Result of a successful mutation.
///
/// `save_warning` is `Some` when the state was applied in memory but the
/// persistence write failed; the governor keeps operating.
#[derive(Debug)]
pub struct Applied {
    /// The state after the mutation.
    pub state: ToggleState,
    /// Non-fatal persistence failure, if the write did not land.
    pub save_warning: Option<StoreError>,
}

/// Owner of the two dependent settings.
///
/// All mutations are synchronous; there is no observable point, in memory
/// or in the store, where `shura_mode` is on while `check_in` is off.
#[derive(Debug)]
pub struct ToggleGovernor<S: SettingsStore> {
    store: S,
    state: ToggleState,
}

impl<S: SettingsStore> ToggleGovernor<S> {
    /// Load stored toggles, defaulting missing keys to off.
    ///
    /// A read failure yields the default state plus a warning. A stored
    /// pair that violates the invariant (external tampering) is normalized
    /// by forcing shura mode off, with a warning log.
    pub fn load(store: S) -> (Self, Option<StoreError>) {
        let mut warning = None;
        let mut read_flag = |key: &str| match store.get(key) {
            Ok(value) => value.as_deref().and_then(parse_flag).unwrap_or(false),
            Err(err) => {
                tracing::warn!(store = store.name(), key, error = %err, "settings read failed");
                warning.get_or_insert(err);
                false
            }
        };

        let mut state = ToggleState {
            check_in: read_flag(CHECK_IN_KEY),
            shura_mode: read_flag(SHURA_MODE_KEY),
        };
        if !state.is_valid() {
            tracing::warn!(
                store = store.name(),
                "stored toggles violate the dependency, disabling shura mode"
            );
            state.shura_mode = false;
        }

        (Self { store, state }, warning)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ToggleState {
        self.state
    }

    /// Access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Set check-in. Disabling cascades shura mode off in the same atomic
    /// update. Infallible; persistence failure is a warning.
    pub fn set_check_in(&mut self, enabled: bool) -> Applied {
        self.state = self.state.with_check_in(enabled);
        self.applied()
    }

    /// Set shura mode.
    ///
    /// Enabling while check-in is off fails with
    /// [`ToggleError::InvalidOperation`] and changes nothing, in memory or
    /// in the store. Disabling always succeeds.
    pub fn set_shura_mode(&mut self, enabled: bool) -> Result<Applied, ToggleError> {
        self.state = self.state.with_shura_mode(enabled)?;
        Ok(self.applied())
    }

    fn applied(&self) -> Applied {
        let save_warning = self.persist().err();
        if let Some(err) = &save_warning {
            tracing::warn!(
                store = self.store.name(),
                error = %err,
                "settings write failed, continuing on in-memory state"
            );
        }
        Applied {
            state: self.state,
            save_warning,
        }
    }

    /// Persist both keys as one logical write.
    ///
    /// Write order keeps the stored pair valid even if the second write is
    /// lost: whenever shura mode ends up off it is written first, and when
    /// it ends up on, check-in (already on) is written first.
    fn persist(&self) -> StoreResult<()> {
        if self.state.shura_mode {
            self.store.set(CHECK_IN_KEY, flag_str(self.state.check_in))?;
            self.store.set(SHURA_MODE_KEY, flag_str(self.state.shura_mode))
        } else {
            self.store.set(SHURA_MODE_KEY, flag_str(self.state.shura_mode))?;
            self.store.set(CHECK_IN_KEY, flag_str(self.state.check_in))
        }
    }
}
