use crate::session::{RemoteAction, SessionState};

use std::fmt;

use error_location::ErrorLocation;
use thiserror::Error;

/// Why a connection to the control endpoint could not be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    /// Host unreachable, connection refused, or WebSocket upgrade failed.
    Unreachable,
    /// The endpoint rejected (or required) a password.
    AuthRejected,
    /// The endpoint spoke something other than the expected protocol.
    ProtocolMismatch,
    /// Connect or handshake did not finish within the configured timeout.
    TimedOut,
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectFailure::Unreachable => "endpoint unreachable",
            ConnectFailure::AuthRejected => "authentication rejected",
            ConnectFailure::ProtocolMismatch => "protocol mismatch",
            ConnectFailure::TimedOut => "connection timed out",
        };
        f.write_str(text)
    }
}

/// Replay-save errors with source location tracking.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Connection settings violate the host/port invariants.
    #[error("Invalid connection config: {reason} {location}")]
    InvalidConfig {
        /// Which invariant was violated.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Transport or authentication failure reaching the endpoint.
    #[error("Connection failed ({kind}): {cause} {location}")]
    Connection {
        /// Broad category of the failure.
        kind: ConnectFailure,
        /// Human-readable cause.
        cause: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Endpoint reachable but a request was rejected or timed out.
    #[error("{action} request failed: {cause} {location}")]
    Call {
        /// The remote action that failed.
        action: RemoteAction,
        /// Human-readable cause.
        cause: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A session method was called in a state that does not allow it.
    #[error("Session misuse: cannot {operation} while {state:?} {location}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// State the session was in.
        state: SessionState,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl ReplayError {
    /// User-facing reason, without the source location suffix.
    pub fn reason(&self) -> String {
        match self {
            ReplayError::InvalidConfig { reason, .. } => {
                format!("Invalid connection settings: {}", reason)
            }
            ReplayError::Connection { kind, cause, .. } => {
                format!("Could not connect to OBS ({}): {}", kind, cause)
            }
            ReplayError::Call { action, cause, .. } => {
                format!("{} was rejected: {}", action, cause)
            }
            ReplayError::InvalidState { operation, state, .. } => {
                format!("Internal error: cannot {} while {:?}", operation, state)
            }
        }
    }

    /// Returns true for errors raised by a single remote request.
    pub fn is_call_error(&self) -> bool {
        matches!(self, ReplayError::Call { .. })
    }
}

/// Result type alias using [`ReplayError`].
pub type Result<T> = std::result::Result<T, ReplayError>;
