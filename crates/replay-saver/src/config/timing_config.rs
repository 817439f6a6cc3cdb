use crate::config::{
    default_activation_delay_ms, default_connect_timeout_ms, default_request_timeout_ms,
};

use std::time::Duration;

use replay_saver_core::{DEFAULT_CLOSE_TIMEOUT, OperationTiming};
use serde::{Deserialize, Serialize};

/// Delays and timeouts for talking to OBS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause between starting the replay buffer and saving it.
    #[serde(default = "default_activation_delay_ms")]
    pub activation_delay_ms: u64,
    /// Connect + handshake timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            activation_delay_ms: default_activation_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl TimingConfig {
    /// Convert to the core timing profile (values are clamped there).
    pub fn operation_timing(&self) -> OperationTiming {
        OperationTiming::new(
            Duration::from_millis(self.activation_delay_ms),
            Duration::from_millis(self.connect_timeout_ms),
            Duration::from_millis(self.request_timeout_ms),
            DEFAULT_CLOSE_TIMEOUT,
        )
    }
}
