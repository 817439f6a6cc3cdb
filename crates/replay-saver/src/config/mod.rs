#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;
mod obs_config;
pub(crate) mod prompt;
mod timing_config;

pub(crate) use {
    config::Config, hotkey_config::HotkeyConfig, obs_config::ObsConfig,
    prompt::ensure_complete,
    timing_config::TimingConfig,
};

use replay_saver_core::{DEFAULT_ACTIVATION_DELAY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

pub(crate) const DEFAULT_OBS_PORT: u16 = 4444;

pub(crate) fn default_activation_delay_ms() -> u64 {
    DEFAULT_ACTIVATION_DELAY.as_millis() as u64
}

pub(crate) fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}
