//! Replay-save orchestration.
//!
//! One run is strictly sequential: connect, start the replay buffer (failure
//! tolerated), wait briefly, save, close. The session is closed on every
//! path, and the first fatal error becomes the outcome.

use crate::{
    ConnectionConfig, CoreResult, OperationTiming, ReplayError,
    session::{Connector, RemoteAction, RemoteSession, SessionTimeouts},
};

use std::fmt;

use tracing::{debug, info, instrument, warn};

/// Notification title for a successful save.
pub const SUCCESS_TITLE: &str = "Replay saved";

/// Notification message for a successful save.
pub const SUCCESS_MESSAGE: &str = "Buffer saved successfully";

/// Notification title for a failed save.
pub const FAILURE_TITLE: &str = "Replay save failed";

/// Steps of one replay-save run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStep {
    /// Opening the session.
    Connecting,
    /// Asking the endpoint to start its replay buffer.
    EnsuringActive,
    /// Fixed pause so the buffer can finish starting.
    Delaying,
    /// Asking the endpoint to save the buffer.
    Saving,
    /// Closing the session.
    Closing,
}

impl fmt::Display for OperationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of one replay-save run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The buffer was saved.
    Success,
    /// Some step failed; `reason` is user-facing and never empty.
    Failure {
        /// What went wrong.
        reason: String,
    },
}

impl OperationOutcome {
    /// Title and message to show the user.
    pub fn notification(&self) -> (&str, &str) {
        match self {
            OperationOutcome::Success => (SUCCESS_TITLE, SUCCESS_MESSAGE),
            OperationOutcome::Failure { reason } => (FAILURE_TITLE, reason.as_str()),
        }
    }

    /// Whether the save succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success)
    }
}

impl From<CoreResult<()>> for OperationOutcome {
    fn from(result: CoreResult<()>) -> Self {
        match result {
            Ok(()) => OperationOutcome::Success,
            Err(e) => {
                let reason = e.reason();
                OperationOutcome::Failure {
                    reason: if reason.trim().is_empty() {
                        "Unknown error".to_string()
                    } else {
                        reason
                    },
                }
            }
        }
    }
}

/// Performs the replay-save sequence against one endpoint.
///
/// Holds no per-run state, so a single instance serves every invocation.
pub struct ReplaySaver<C: Connector> {
    connector: C,
    config: ConnectionConfig,
    timing: OperationTiming,
}

impl<C: Connector> ReplaySaver<C> {
    /// Create a saver for `config` using `connector` to reach it.
    pub fn new(connector: C, config: ConnectionConfig, timing: OperationTiming) -> Self {
        Self {
            connector,
            config,
            timing,
        }
    }

    /// Endpoint this saver targets.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Run the sequence once.
    ///
    /// Never fails: every error is folded into the returned outcome.
    #[instrument(skip(self), fields(host = %self.config.host(), port = self.config.port()))]
    pub async fn save_replay(&self) -> OperationOutcome {
        let mut session = RemoteSession::new(SessionTimeouts::from(&self.timing));

        let result = self.drive(&mut session).await;

        debug!(step = %OperationStep::Closing, "Closing session");
        session.close().await;

        match &result {
            Ok(()) => info!("Replay buffer saved"),
            Err(e) => warn!(error = %e, "Replay save failed"),
        }

        OperationOutcome::from(result)
    }

    async fn drive(&self, session: &mut RemoteSession<C::Transport>) -> CoreResult<()> {
        debug!(step = %OperationStep::Connecting, "Connecting");
        session.connect(&self.connector, &self.config).await?;

        debug!(step = %OperationStep::EnsuringActive, "Starting replay buffer");
        match session.call(RemoteAction::EnsureBufferActive).await {
            Ok(()) => debug!("Replay buffer started"),
            // OBS has no idempotent "ensure"; a rejected start usually means
            // the buffer is already running.
            Err(ReplayError::Call { cause, .. }) => {
                debug!(cause = %cause, "Start replay buffer rejected, continuing")
            }
            Err(e) => return Err(e),
        }

        debug!(
            step = %OperationStep::Delaying,
            delay_ms = self.timing.activation_delay().as_millis(),
            "Waiting for replay buffer"
        );
        tokio::time::sleep(self.timing.activation_delay()).await;

        debug!(step = %OperationStep::Saving, "Saving replay buffer");
        session.call(RemoteAction::SaveBuffer).await
    }
}
