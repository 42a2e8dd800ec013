#![forbid(unsafe_code)]

//! Session status, terminal outcomes, and session-level errors.

use std::fmt;

/// Observable lifecycle state of an overlay session.
///
/// Sessions start in [`Viewing`](Self::Viewing) and end in
/// [`Closed`](Self::Closed); the intermediate states exist only between a
/// stop request and its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// The simulated intruder is viewing; the auto-timeout is pending.
    Viewing,
    /// A stop request was accepted; the resolution timer is pending.
    Stopping,
    /// The stop attempt resolved in the viewer's favor; settling.
    Succeeded,
    /// The stop attempt resolved against the viewer; settling.
    Failed,
    /// Terminal. The outcome is fixed and has been delivered.
    Closed,
}

impl SessionStatus {
    /// Whether the session has reached its terminal state.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Viewing => "viewing",
            Self::Stopping => "stopping",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Terminal classification of a closed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// The interaction ran to completion unopposed.
    Allowed,
    /// The viewer interrupted successfully.
    Stopped,
    /// The viewer interrupted unsuccessfully.
    FailedToStop,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Allowed => "allowed",
            Self::Stopped => "stopped",
            Self::FailedToStop => "failed-to-stop",
        };
        f.write_str(s)
    }
}

/// Errors reported by session operations.
///
/// Both variants are benign: the session rejects the request and keeps its
/// current state. Nothing here is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// A stop request arrived while the session was not in `Viewing`.
    InvalidState {
        /// Status at the time of the rejected request.
        status: SessionStatus,
    },
    /// An open was attempted while an unclosed session already exists for
    /// the same handle.
    AlreadyOpen {
        /// Status of the session that is still active.
        status: SessionStatus,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { status } => {
                write!(f, "stop request rejected: session is {status}, not viewing")
            }
            Self::AlreadyOpen { status } => {
                write!(f, "open rejected: a session is still active ({status})")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_is_the_only_terminal_status() {
        assert!(SessionStatus::Closed.is_closed());
        for status in [
            SessionStatus::Viewing,
            SessionStatus::Stopping,
            SessionStatus::Succeeded,
            SessionStatus::Failed,
        ] {
            assert!(!status.is_closed(), "{status} must not be terminal");
        }
    }

    #[test]
    fn error_display_names_the_offending_status() {
        let err = SessionError::InvalidState {
            status: SessionStatus::Stopping,
        };
        assert!(err.to_string().contains("stopping"));
    }
}
