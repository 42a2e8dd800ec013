#![forbid(unsafe_code)]

//! Dependent-toggle state and its validating transitions.
//!
//! Two persisted booleans with one dependency: shura mode requires
//! check-in. The transitions here are pure functions from state to state;
//! a state violating `shura_mode ⇒ check_in` cannot be produced through
//! them. Persistence and warning surfacing live in the runtime governor.

use std::fmt;

/// The pair of dependent settings.
///
/// Invariant: `shura_mode` implies `check_in`. Both transitions preserve
/// it; [`is_valid`](Self::is_valid) checks it for data loaded from outside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToggleState {
    /// Whether check-in is enabled.
    pub check_in: bool,
    /// Whether shura mode is enabled. Requires `check_in`.
    pub shura_mode: bool,
}

impl ToggleState {
    /// Both toggles off; the default for a first run.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            check_in: false,
            shura_mode: false,
        }
    }

    /// Whether the dependency invariant holds.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !self.shura_mode || self.check_in
    }

    /// Set check-in.
    ///
    /// Disabling cascades shura mode off in the same step, so the result
    /// is always valid. Infallible.
    #[must_use]
    pub const fn with_check_in(self, enabled: bool) -> Self {
        Self {
            check_in: enabled,
            shura_mode: self.shura_mode && enabled,
        }
    }

    /// Set shura mode.
    ///
    /// Enabling requires check-in to already be on; the transition never
    /// enables check-in on the caller's behalf. Disabling always succeeds.
    pub const fn with_shura_mode(self, enabled: bool) -> Result<Self, ToggleError> {
        if enabled && !self.check_in {
            return Err(ToggleError::InvalidOperation);
        }
        Ok(Self {
            check_in: self.check_in,
            shura_mode: enabled,
        })
    }
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "check_in={}, shura_mode={}",
            self.check_in, self.shura_mode
        )
    }
}

/// Rejected toggle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleError {
    /// Shura mode cannot be enabled while check-in is off.
    InvalidOperation,
}

impl fmt::Display for ToggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOperation => {
                f.write_str("shura mode requires check-in to be enabled")
            }
        }
    }
}

impl std::error::Error for ToggleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_both_off_and_valid() {
        let state = ToggleState::default();
        assert!(!state.check_in);
        assert!(!state.shura_mode);
        assert!(state.is_valid());
    }

    #[test]
    fn enabling_shura_without_check_in_is_rejected() {
        let state = ToggleState::new();
        assert_eq!(
            state.with_shura_mode(true),
            Err(ToggleError::InvalidOperation)
        );
    }

    #[test]
    fn enabling_shura_with_check_in_succeeds() {
        let state = ToggleState::new().with_check_in(true);
        let state = state.with_shura_mode(true).unwrap();
        assert!(state.check_in);
        assert!(state.shura_mode);
    }

    #[test]
    fn disabling_check_in_cascades_shura_off() {
        let state = ToggleState {
            check_in: true,
            shura_mode: true,
        };
        let state = state.with_check_in(false);
        assert_eq!(state, ToggleState::new());
    }

    #[test]
    fn disabling_shura_always_succeeds() {
        for check_in in [false, true] {
            let state = ToggleState {
                check_in,
                shura_mode: check_in,
            };
            let next = state.with_shura_mode(false).unwrap();
            assert!(!next.shura_mode);
            assert_eq!(next.check_in, check_in);
        }
    }

    #[test]
    fn re_enabling_check_in_does_not_resurrect_shura() {
        let state = ToggleState {
            check_in: true,
            shura_mode: true,
        };
        let state = state.with_check_in(false).with_check_in(true);
        assert!(state.check_in);
        assert!(!state.shura_mode);
    }
}
