//! Single-connection lifecycle to the control endpoint.
//!
//! [`Connector`] and [`Transport`] are the protocol seam: they know how to
//! reach the endpoint and exchange one request. [`RemoteSession`] wraps a
//! transport with the lifecycle rules every operation relies on: bounded
//! timeouts on each step and an idempotent, infallible close.

use crate::{ConnectFailure, ConnectionConfig, CoreResult, OperationTiming, ReplayError};

use std::{fmt, future::Future, panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Remote-control actions issued during a replay save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    /// Start the replay buffer. Fails if it is already running.
    EnsureBufferActive,
    /// Write the current replay buffer to disk.
    SaveBuffer,
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteAction::EnsureBufferActive => f.write_str("Start replay buffer"),
            RemoteAction::SaveBuffer => f.write_str("Save replay buffer"),
        }
    }
}

/// Lifecycle of a [`RemoteSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport yet.
    Unconnected,
    /// Handshake finished; requests may be issued.
    Connected,
    /// Closed. Terminal.
    Closed,
}

/// Opens transports to the control endpoint.
pub trait Connector: Send + Sync + 'static {
    /// Transport produced by a successful connect.
    type Transport: Transport;

    /// Connect and complete any handshake/authentication.
    ///
    /// Must not retry. A transport that fails partway through the handshake
    /// is released before the error is returned.
    fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> impl Future<Output = CoreResult<Self::Transport>> + Send;
}

/// An established connection able to issue requests.
pub trait Transport: Send + 'static {
    /// Send one request and wait for its acknowledgement. No retries.
    fn request(&mut self, action: RemoteAction) -> impl Future<Output = CoreResult<()>> + Send;

    /// Best-effort shutdown of the connection. Never fails.
    fn shutdown(&mut self) -> impl Future<Output = ()> + Send;
}

/// Timeouts applied by [`RemoteSession`] to each transport step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Bound on connect + handshake.
    pub connect: Duration,
    /// Bound on one request round trip.
    pub request: Duration,
    /// Bound on shutdown.
    pub close: Duration,
}

impl From<&OperationTiming> for SessionTimeouts {
    fn from(timing: &OperationTiming) -> Self {
        Self {
            connect: timing.connect_timeout(),
            request: timing.request_timeout(),
            close: timing.close_timeout(),
        }
    }
}

/// One connection to the endpoint, exclusively owned by one operation.
pub struct RemoteSession<T: Transport> {
    transport: Option<T>,
    state: SessionState,
    timeouts: SessionTimeouts,
}

impl<T: Transport> RemoteSession<T> {
    /// Create an unconnected session.
    pub fn new(timeouts: SessionTimeouts) -> Self {
        Self {
            transport: None,
            state: SessionState::Unconnected,
            timeouts,
        }
    }

    /// Create a session and connect it in one step.
    ///
    /// # Errors
    ///
    /// See [`RemoteSession::connect`].
    pub async fn open<C>(
        connector: &C,
        config: &ConnectionConfig,
        timeouts: SessionTimeouts,
    ) -> CoreResult<Self>
    where
        C: Connector<Transport = T>,
    {
        let mut session = Self::new(timeouts);
        session.connect(connector, config).await?;
        Ok(session)
    }

    /// Connect to the endpoint described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Connection`] if the connector fails or does not
    /// finish within the connect timeout, and [`ReplayError::InvalidState`]
    /// if the session is not `Unconnected`.
    #[instrument(skip(self, connector, config), fields(host = %config.host(), port = config.port()))]
    pub async fn connect<C>(&mut self, connector: &C, config: &ConnectionConfig) -> CoreResult<()>
    where
        C: Connector<Transport = T>,
    {
        if self.state != SessionState::Unconnected {
            warn!(state = ?self.state, "Connect called on a used session");
            return Err(ReplayError::InvalidState {
                operation: "connect",
                state: self.state,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let transport = match timeout(self.timeouts.connect, connector.connect(config)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ReplayError::Connection {
                    kind: ConnectFailure::TimedOut,
                    cause: format!(
                        "no answer from {}:{} within {} ms",
                        config.host(),
                        config.port(),
                        self.timeouts.connect.as_millis()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        self.transport = Some(transport);
        self.state = SessionState::Connected;
        debug!("Session connected");

        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Issue one request and wait for its acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Call`] if the session is not connected, the
    /// endpoint rejects the request, or no answer arrives in time.
    #[instrument(skip(self))]
    pub async fn call(&mut self, action: RemoteAction) -> CoreResult<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(ReplayError::Call {
                action,
                cause: format!("session is {:?}", self.state),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        match timeout(self.timeouts.request, transport.request(action)).await {
            Ok(result) => result,
            Err(_) => Err(ReplayError::Call {
                action,
                cause: format!(
                    "no acknowledgement within {} ms",
                    self.timeouts.request.as_millis()
                ),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Close the session. Safe to call in any state and repeatedly; only
    /// the first call on a connected session reaches the transport.
    #[instrument(skip(self))]
    pub async fn close(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            self.state = SessionState::Closed;
            return;
        };

        if timeout(self.timeouts.close, transport.shutdown()).await.is_err() {
            debug!("Transport shutdown timed out, dropping connection");
        }

        self.state = SessionState::Closed;
        debug!("Session closed");
    }
}

impl<T: Transport> Drop for RemoteSession<T> {
    fn drop(&mut self) {
        if self.transport.take().is_some() {
            warn!("Session dropped while connected; connection released without close handshake");
        }
    }
}
