//! Validated connection settings and operation timing.

use crate::{CoreResult, ReplayError};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;

/// Default pause between starting the replay buffer and saving it.
pub const DEFAULT_ACTIVATION_DELAY: Duration = Duration::from_millis(100);

/// Upper bound for the activation delay.
pub const MAX_ACTIVATION_DELAY: Duration = Duration::from_secs(2);

/// Default timeout for connect + handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for a single request/acknowledge round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for the closing handshake.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

const MIN_TIMEOUT: Duration = Duration::from_millis(100);
const MAX_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the control endpoint lives and how to authenticate with it.
///
/// Only constructible through [`ConnectionConfig::new`], so a value of this
/// type always has a non-empty host and a non-zero port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    credential: Option<String>,
}

impl ConnectionConfig {
    /// Validate and build a connection config.
    ///
    /// An empty credential is treated as "no authentication".
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidConfig`] if the host is blank or the
    /// port is zero.
    #[track_caller]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        credential: Option<String>,
    ) -> CoreResult<Self> {
        let host = host.into().trim().to_string();

        if host.is_empty() {
            return Err(ReplayError::InvalidConfig {
                reason: "host must not be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if port == 0 {
            return Err(ReplayError::InvalidConfig {
                reason: "port must be between 1 and 65535".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let credential = credential.filter(|c| !c.is_empty());

        Ok(Self {
            host,
            port,
            credential,
        })
    }

    /// Host name or IP address of the endpoint.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port of the endpoint.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Password, if authentication is configured.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// WebSocket URL for the endpoint.
    pub fn url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("ws://[{}]:{}", self.host, self.port)
        } else {
            format!("ws://{}:{}", self.host, self.port)
        }
    }
}

/// Delays and timeouts applied to one replay-save operation.
///
/// Every value is clamped on construction: the activation delay never
/// exceeds [`MAX_ACTIVATION_DELAY`] and no timeout is zero or unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTiming {
    activation_delay: Duration,
    connect_timeout: Duration,
    request_timeout: Duration,
    close_timeout: Duration,
}

impl OperationTiming {
    /// Build a timing profile, clamping each value into its allowed range.
    pub fn new(
        activation_delay: Duration,
        connect_timeout: Duration,
        request_timeout: Duration,
        close_timeout: Duration,
    ) -> Self {
        Self {
            activation_delay: activation_delay.min(MAX_ACTIVATION_DELAY),
            connect_timeout: connect_timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT),
            request_timeout: request_timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT),
            close_timeout: close_timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT),
        }
    }

    /// Pause between `EnsureBufferActive` and `SaveBuffer`.
    pub fn activation_delay(&self) -> Duration {
        self.activation_delay
    }

    /// Bound on connect + handshake.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Bound on one request round trip.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Bound on the closing handshake.
    pub fn close_timeout(&self) -> Duration {
        self.close_timeout
    }
}

impl Default for OperationTiming {
    fn default() -> Self {
        Self::new(
            DEFAULT_ACTIVATION_DELAY,
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_REQUEST_TIMEOUT,
            DEFAULT_CLOSE_TIMEOUT,
        )
    }
}
